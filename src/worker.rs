//! The `Worker` trait and the per-worker execution context (§5 "Workers").
//!
//! Grounded on the reference daemon's task-per-subsystem shape: each long-
//! running concern (`run_monitoring_loop` in `bin/urd.rs`, `CommandStream::run`
//! in `stream.rs`) is its own `tokio::spawn`'d loop cooperating with a shared
//! cancellation flag. This generalizes that into a trait the [`crate::hub::Hub`]
//! can drive uniformly, and swaps the reference's `Arc<AtomicBool>` flag for a
//! `tokio_util`-free hand-rolled [`CancelToken`] built the same way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Cooperative cancellation signal, checked between ticks and at the top of
/// every blocking recv loop a worker runs.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tells the Hub whether a worker's loop should continue after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Break,
}

/// Per-worker tunables the Hub applies uniformly.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// When `false`, the Hub runs exactly one `tick` then tears the worker down.
    pub loop_forever: bool,
    /// Minimum spacing between successive `tick` calls.
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { loop_forever: true, interval: Duration::from_millis(0) }
    }
}

/// Handed to a worker on every call; carries identity and the cancellation
/// token the Hub uses to request shutdown.
#[derive(Clone)]
pub struct Ctx {
    pub name: String,
    pub cancel: CancelToken,
}

impl Ctx {
    pub fn new(name: impl Into<String>, cancel: CancelToken) -> Self {
        Self { name: name.into(), cancel }
    }
}

/// A supervised unit of work inside a [`crate::hub::Hub`].
///
/// `setup` runs once before the first tick and must complete before the Hub
/// starts the next worker in registration order (§5 "ordered startup").
/// `teardown` always runs, even if `setup` or a `tick` failed or the worker
/// was cancelled mid-loop.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn setup(&mut self, ctx: &Ctx) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    async fn tick(&mut self, ctx: &Ctx) -> Result<ControlFlow>;

    async fn teardown(&mut self, ctx: &Ctx) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
