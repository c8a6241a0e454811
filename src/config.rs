//! Configuration for the RoboMaster SDK.
//!
//! Mirrors the reference daemon's `DaemonConfig`: an optional YAML file on disk,
//! with every field falling back to a sensible programmatic default so a caller
//! can construct a [`Config`] purely in code and never touch the filesystem.

use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::error::Result;

/// Push/event/hub-wide tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub robot: RobotConfig,
    pub queues: QueueConfig,
    pub hub: HubConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Explicit host; when `None`, the Commander runs IP Discovery first.
    pub host: Option<String>,
    pub ports: PortConfig,
    pub command_timeout_secs: f64,
    pub discovery_timeout_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortConfig {
    pub command: u16,
    pub push: u16,
    pub event: u16,
    pub broadcast: u16,
    pub video: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Bounded capacity for push/event queues (drop-newest on overflow).
    pub capacity: usize,
    /// Receive-timeout granularity used by UDP listeners to observe cancellation.
    pub recv_poll_millis: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    pub graceful_deadline_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            robot: RobotConfig::default(),
            queues: QueueConfig::default(),
            hub: HubConfig::default(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            host: None,
            ports: PortConfig::default(),
            command_timeout_secs: 30.0,
            discovery_timeout_secs: 10.0,
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            command: 40923,
            push: 40924,
            event: 40925,
            broadcast: 40926,
            video: 40921,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            recv_poll_millis: 250,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            graceful_deadline_secs: 5.0,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, falling back to defaults for any
    /// field the file omits (via `#[serde(default)]` on every nested struct).
    pub fn load_from_path(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.robot.command_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.robot.discovery_timeout_secs)
    }

    pub fn graceful_deadline(&self) -> Duration {
        Duration::from_secs_f64(self.hub.graceful_deadline_secs)
    }

    pub fn recv_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queues.recv_poll_millis)
    }
}
