//! Listens on the push telemetry port and forwards decoded records to a
//! bounded, drop-newest queue (§4.3, §5).

use std::net::UdpSocket;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::queue::DropNewestSender;
use crate::wire::push::{self, PushRecord};
use crate::worker::{ControlFlow, Ctx, Worker};

pub struct PushListener {
    port: u16,
    poll_interval: Duration,
    sender: DropNewestSender<PushRecord>,
    socket: Option<UdpSocket>,
}

impl PushListener {
    pub fn new(port: u16, poll_interval: Duration, sender: DropNewestSender<PushRecord>) -> Self {
        Self { port, poll_interval, sender, socket: None }
    }
}

#[async_trait]
impl Worker for PushListener {
    async fn setup(&mut self, ctx: &Ctx) -> Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", self.port))?;
        socket.set_read_timeout(Some(self.poll_interval))?;
        tracing::info!(worker = %ctx.name, port = self.port, "push listener bound");
        self.socket = Some(socket);
        Ok(())
    }

    async fn tick(&mut self, ctx: &Ctx) -> Result<ControlFlow> {
        let socket = self.socket.as_ref().expect("setup runs before tick");
        let mut buf = [0u8; 1024];

        match socket.recv_from(&mut buf) {
            Ok((n, _addr)) => {
                let payload = String::from_utf8_lossy(&buf[..n]);
                // One datagram may carry several `;`-separated records; forward each
                // in arrival order rather than only the first.
                for record in push::parse(&payload) {
                    if !self.sender.offer(record) {
                        tracing::warn!(worker = %ctx.name, "push queue full, dropping newest record");
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }

        Ok(ControlFlow::Continue)
    }

    async fn teardown(&mut self, ctx: &Ctx) -> Result<()> {
        tracing::info!(worker = %ctx.name, "push listener stopped");
        self.socket = None;
        Ok(())
    }
}
