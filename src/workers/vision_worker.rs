//! Pulls decoded frames from the video port and publishes the most recent one
//! to a drop-oldest single slot (§4.5, §5).

use std::net::TcpStream;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::queue::LatestSlot;
use crate::vision::{Frame, FrameDecoder};
use crate::worker::{ControlFlow, Ctx, Worker};
use std::sync::Arc;

pub struct VisionWorker {
    host: String,
    port: u16,
    decoder: Option<Box<dyn FrameDecoder>>,
    frames: Option<Box<dyn Iterator<Item = Frame> + Send>>,
    slot: Arc<LatestSlot<Frame>>,
}

impl VisionWorker {
    pub fn new(host: impl Into<String>, port: u16, decoder: Box<dyn FrameDecoder>, slot: Arc<LatestSlot<Frame>>) -> Self {
        Self { host: host.into(), port, decoder: Some(decoder), frames: None, slot }
    }
}

#[async_trait]
impl Worker for VisionWorker {
    async fn setup(&mut self, ctx: &Ctx) -> Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        let decoder = self.decoder.take().ok_or_else(|| {
            Error::Remote("vision worker setup called twice".to_string())
        })?;
        tracing::info!(worker = %ctx.name, host = %self.host, port = self.port, "vision stream connected");
        self.frames = Some(decoder.open(stream));
        Ok(())
    }

    async fn tick(&mut self, ctx: &Ctx) -> Result<ControlFlow> {
        // `next()` blocks on the underlying socket read; cancellation is only
        // observed between frames, not mid-read. Acceptable for a frame cadence
        // measured in tens of milliseconds.
        let frames = self.frames.as_mut().expect("setup runs before tick");
        match frames.next() {
            Some(frame) => {
                self.slot.set(frame);
                Ok(ControlFlow::Continue)
            }
            None => {
                tracing::info!(worker = %ctx.name, "video stream ended");
                Ok(ControlFlow::Break)
            }
        }
    }

    async fn teardown(&mut self, ctx: &Ctx) -> Result<()> {
        tracing::info!(worker = %ctx.name, "vision worker stopped");
        self.frames = None;
        Ok(())
    }
}
