//! Sugar for the caller's own decision loop: a [`Worker`] that just calls back
//! into user logic every tick with a live Commander handle (§5 "Sugared
//! workers" — the counterpart to the reference daemon's top-level command
//! loop in `stream.rs::CommandStream::run`, minus the stdin-command parsing
//! this crate leaves to its caller).

use std::sync::Arc;

use async_trait::async_trait;

use crate::commander::Commander;
use crate::error::Result;
use crate::worker::{ControlFlow, Ctx, Worker};

/// User-supplied control logic driven once per Hub tick.
#[async_trait]
pub trait MindLogic: Send + Sync {
    async fn think(&mut self, commander: &Commander, ctx: &Ctx) -> Result<ControlFlow>;
}

pub struct Mind<T: MindLogic> {
    commander: Arc<Commander>,
    logic: T,
}

impl<T: MindLogic> Mind<T> {
    pub fn new(commander: Arc<Commander>, logic: T) -> Self {
        Self { commander, logic }
    }
}

#[async_trait]
impl<T: MindLogic> Worker for Mind<T> {
    async fn tick(&mut self, ctx: &Ctx) -> Result<ControlFlow> {
        self.logic.think(&self.commander, ctx).await
    }
}
