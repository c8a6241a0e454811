//! Listens on the event port and forwards decoded records, optionally
//! enriched with a live Commander query, to a bounded drop-newest queue
//! (§4.4, §5).

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;

use crate::commander::Commander;
use crate::error::Result;
use crate::queue::DropNewestSender;
use crate::wire::event::{self, EventRecord};
use crate::worker::{ControlFlow, Ctx, Worker};

/// An event record paired with best-effort chassis attitude at the moment it
/// arrived. Enrichment is opportunistic: if the Commander query fails (the
/// session is busy, closed, or the robot is slow to answer) the record still
/// ships, just without `chassis_attitude`.
///
/// `received_at_ms` is stamped from the datagram's arrival, before the
/// (potentially slow) enrichment query runs, so it reflects when the event
/// actually happened rather than when enrichment finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEvent {
    pub record: EventRecord,
    pub chassis_attitude: Option<String>,
    pub received_at_ms: f64,
}

fn now_ms() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64() * 1000.0
}

pub struct EventListener {
    port: u16,
    poll_interval: Duration,
    sender: DropNewestSender<EnrichedEvent>,
    enrichment_commander: Option<Arc<Commander>>,
    socket: Option<UdpSocket>,
}

impl EventListener {
    pub fn new(port: u16, poll_interval: Duration, sender: DropNewestSender<EnrichedEvent>) -> Self {
        Self { port, poll_interval, sender, enrichment_commander: None, socket: None }
    }

    /// Attach a Commander whose `get_chassis_attitude` is queried once per
    /// event. The Commander's single-flight mutex means this competes with
    /// other callers for the same session; pass a dedicated Commander to
    /// avoid stalling the control path.
    pub fn with_enrichment(mut self, commander: Arc<Commander>) -> Self {
        self.enrichment_commander = Some(commander);
        self
    }
}

#[async_trait]
impl Worker for EventListener {
    async fn setup(&mut self, ctx: &Ctx) -> Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", self.port))?;
        socket.set_read_timeout(Some(self.poll_interval))?;
        tracing::info!(worker = %ctx.name, port = self.port, "event listener bound");
        self.socket = Some(socket);
        Ok(())
    }

    async fn tick(&mut self, ctx: &Ctx) -> Result<ControlFlow> {
        let socket = self.socket.as_ref().expect("setup runs before tick");
        let mut buf = [0u8; 1024];

        match socket.recv_from(&mut buf) {
            Ok((n, _addr)) => {
                let received_at_ms = now_ms();
                let payload = String::from_utf8_lossy(&buf[..n]);
                // One datagram may carry several `;`-separated records; forward each
                // in arrival order, all stamped with this datagram's receipt time.
                for record in event::parse(&payload) {
                    let chassis_attitude = self.enrich();
                    let enriched = EnrichedEvent { record, chassis_attitude, received_at_ms };
                    if !self.sender.offer(enriched) {
                        tracing::warn!(worker = %ctx.name, "event queue full, dropping newest record");
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }

        Ok(ControlFlow::Continue)
    }

    async fn teardown(&mut self, ctx: &Ctx) -> Result<()> {
        tracing::info!(worker = %ctx.name, "event listener stopped");
        self.socket = None;
        Ok(())
    }
}

impl EventListener {
    fn enrich(&self) -> Option<String> {
        let commander = self.enrichment_commander.as_ref()?;
        match commander.get_chassis_attitude() {
            Ok(attitude) => Some(attitude),
            Err(e) => {
                tracing::warn!(error = %e, "event enrichment failed, emitting without chassis attitude");
                None
            }
        }
    }
}
