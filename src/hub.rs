//! The Hub — supervises a registered set of [`crate::worker::Worker`]s through
//! a shared lifecycle (§5 "Hub").
//!
//! The state machine and shutdown fan-out generalize `CommandStream`'s signal
//! handling (`stream.rs::setup_shutdown_handler`) from "one task reacting to
//! Ctrl+C" into "every registered worker reacts to Ctrl+C, SIGTERM, or an
//! explicit `close()`, and the Hub waits out a grace period before killing
//! stragglers" — the same `tokio::select!` over `ctrl_c()` and
//! `signal::unix::SignalKind::terminate()`, generalized across a worker list.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::worker::{CancelToken, ControlFlow, Ctx, Worker, WorkerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Idle,
    Starting,
    Running,
    Stopping,
    Killing,
    Stopped,
}

impl fmt::Display for HubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Cloneable remote control for a [`Hub`] that has already been handed to
/// `run()`.
#[derive(Clone)]
pub struct HubHandle {
    shutdown_tx: watch::Sender<bool>,
    state: Arc<Mutex<HubState>>,
}

impl HubHandle {
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn state(&self) -> HubState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct Descriptor {
    name: String,
    worker: Box<dyn Worker>,
    config: WorkerConfig,
}

/// Supervises worker startup, the running phase, and coordinated shutdown.
pub struct Hub {
    descriptors: Vec<Descriptor>,
    graceful_deadline: Duration,
    state: Arc<Mutex<HubState>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Hub {
    pub fn new(graceful_deadline: Duration) -> Self {
        let (shutdown_tx, _rx) = watch::channel(false);
        Self {
            descriptors: Vec::new(),
            graceful_deadline,
            state: Arc::new(Mutex::new(HubState::Idle)),
            shutdown_tx,
        }
    }

    pub fn state(&self) -> HubState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// A cloneable, `'static` handle for requesting shutdown or polling state
    /// from outside the task `run()` executes on (`run` consumes the Hub).
    pub fn handle(&self) -> HubHandle {
        HubHandle { shutdown_tx: self.shutdown_tx.clone(), state: self.state.clone() }
    }

    /// Register a worker. Insertion order is startup order. Rejected once the
    /// Hub has left `Idle`.
    pub fn worker(&mut self, name: impl Into<String>, worker: impl Worker + 'static, config: WorkerConfig) -> Result<()> {
        if self.state() != HubState::Idle {
            return Err(Error::HubShuttingDown);
        }
        self.descriptors.push(Descriptor { name: name.into(), worker: Box::new(worker), config });
        Ok(())
    }

    /// Request shutdown from outside the Hub's own task (e.g. an owning
    /// application calling this from a different async task).
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    fn set_state(&self, next: HubState) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        tracing::info!(from = %*state, to = %next, "hub state transition");
        *state = next;
    }

    /// Start every registered worker in order, then run until a shutdown
    /// signal (`close()`, Ctrl+C, SIGTERM, or a fatal worker exit) arrives,
    /// then tear everything down within the configured grace period.
    pub async fn run(mut self) -> Result<()> {
        self.set_state(HubState::Starting);
        let master_cancel = CancelToken::new();

        let mut joins: JoinSet<(String, Result<()>)> = JoinSet::new();
        let mut fatal: Option<Error> = None;

        for descriptor in self.descriptors.drain(..) {
            let Descriptor { name, mut worker, config } = descriptor;
            let ctx = Ctx::new(name.clone(), master_cancel.clone());
            let (started_tx, started_rx) = tokio::sync::oneshot::channel::<Result<()>>();

            joins.spawn(async move {
                let result = run_one_worker(&mut *worker, ctx, config, started_tx).await;
                (name, result)
            });

            match started_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "worker failed during startup");
                    fatal = Some(e);
                    break;
                }
                Err(_) => {
                    // Worker task died before reporting; its join result carries the error.
                }
            }
        }

        if fatal.is_none() {
            self.set_state(HubState::Running);
            fatal = self.wait_for_shutdown_trigger(&mut joins).await;
        }

        self.set_state(HubState::Stopping);
        master_cancel.cancel();

        let drained = tokio::time::timeout(self.graceful_deadline, drain_all(&mut joins)).await;
        if drained.is_err() {
            self.set_state(HubState::Killing);
            joins.abort_all();
            while joins.join_next().await.is_some() {}
        }

        self.set_state(HubState::Stopped);
        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Waits for an external shutdown trigger (Ctrl+C, SIGTERM, `close()`) or a
    /// fatal worker exit. A worker that finishes on its own with `Ok(())` —
    /// the normal outcome for a one-shot (`loop_forever: false`) worker that
    /// hit `ControlFlow::Break` — is reaped quietly and the wait continues;
    /// it does not by itself bring the Hub down. Only once every worker has
    /// finished this way, or one of them exits with an error, does the wait
    /// end without an external trigger.
    async fn wait_for_shutdown_trigger(&self, joins: &mut JoinSet<(String, Result<()>)>) -> Option<Error> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                tracing::info!("close() requested, shutting down");
                return None;
            }

            let ctrl_c = tokio::signal::ctrl_c();

            #[cfg(unix)]
            let terminate = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sig) => {
                        sig.recv().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("received interrupt, shutting down");
                    return None;
                }
                _ = terminate => {
                    tracing::info!("received termination signal, shutting down");
                    return None;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("close() requested, shutting down");
                        return None;
                    }
                }
                joined = joins.join_next() => {
                    match joined {
                        None => {
                            tracing::info!("all workers finished, shutting down");
                            return None;
                        }
                        Some(Ok((name, Err(e)))) => {
                            tracing::error!(worker = %name, error = %e, "worker exited with a fatal error");
                            return Some(e);
                        }
                        Some(Ok((name, Ok(())))) => {
                            tracing::info!(worker = %name, "worker finished, hub keeps running");
                        }
                        Some(Err(join_err)) => {
                            tracing::error!(error = %join_err, "worker task panicked");
                            return Some(Error::Remote(join_err.to_string()));
                        }
                    }
                }
            }
        }
    }
}

async fn run_one_worker(
    worker: &mut dyn Worker,
    ctx: Ctx,
    config: WorkerConfig,
    started_tx: tokio::sync::oneshot::Sender<Result<()>>,
) -> Result<()> {
    if let Err(e) = worker.setup(&ctx).await {
        let _ = started_tx.send(Err(clone_for_report(&e)));
        let _ = worker.teardown(&ctx).await;
        return Err(e);
    }

    let first = worker.tick(&ctx).await;
    let flow = match first {
        Ok(flow) => {
            let _ = started_tx.send(Ok(()));
            flow
        }
        Err(e) => {
            let _ = started_tx.send(Err(clone_for_report(&e)));
            let _ = worker.teardown(&ctx).await;
            return Err(e);
        }
    };

    let result = run_tick_loop(worker, &ctx, &config, flow).await;
    let teardown_result = worker.teardown(&ctx).await;
    result.and(teardown_result)
}

async fn run_tick_loop(worker: &mut dyn Worker, ctx: &Ctx, config: &WorkerConfig, first_flow: ControlFlow) -> Result<()> {
    let mut flow = first_flow;
    loop {
        if flow == ControlFlow::Break || ctx.cancel.is_cancelled() || !config.loop_forever {
            return Ok(());
        }
        if !config.interval.is_zero() {
            tokio::time::sleep(config.interval).await;
        }
        if ctx.cancel.is_cancelled() {
            return Ok(());
        }
        flow = worker.tick(ctx).await?;
    }
}

async fn drain_all(joins: &mut JoinSet<(String, Result<()>)>) {
    while joins.join_next().await.is_some() {}
}

/// `Error` isn't `Clone`; startup reporting needs the message on both the
/// oneshot report and the task's own return value, so render it once.
fn clone_for_report(e: &Error) -> Error {
    Error::Remote(e.to_string())
}
