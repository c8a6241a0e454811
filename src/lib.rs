//! Client SDK and concurrent control framework for the RoboMaster EP
//! educational robot.
//!
//! [`commander::Commander`] speaks the robot's text protocol over TCP; the
//! [`wire`] module decodes its UDP push and event telegrams; [`vision`] pulls
//! the video feed; [`worker`] and [`hub`] supervise however many of those run
//! concurrently inside one program.

pub mod commander;
pub mod config;
pub mod discovery;
pub mod error;
pub mod hub;
pub mod queue;
pub mod vision;
pub mod wire;
pub mod worker;
pub mod workers;

pub use commander::{Arg, ArmorEventKind, BlasterFireMode, Commander, LedComponent, RobotMode, SoundEventKind};
pub use config::Config;
pub use error::{Error, Result};
pub use hub::{Hub, HubHandle, HubState};
pub use queue::{DropNewestQueue, DropNewestSender, LatestSlot, LatestSlotReceiver};
pub use vision::{Frame, FrameDecoder, NullDecoder};
pub use wire::event::{ArmorHitKind, EventRecord};
pub use wire::push::{ChassisStatus, PushRecord};
pub use worker::{CancelToken, ControlFlow, Ctx, Worker, WorkerConfig};
pub use workers::{EnrichedEvent, EventListener, Mind, MindLogic, PushListener, VisionWorker};
