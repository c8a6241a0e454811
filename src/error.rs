//! Crate-wide error taxonomy for the RoboMaster SDK.
//!
//! One `thiserror` enum covers every subsystem (Commander, discovery, push/event
//! parsing, Hub supervision) so callers can match on a single type across module
//! boundaries, the way `urd::error::URError` does for the reference daemon.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timed out")]
    Timeout,

    #[error("handshake failed: expected 'ok', got {got:?}")]
    Handshake { got: String },

    #[error("robot rejected command: {0}")]
    Remote(String),

    #[error("invalid argument {field}: {reason}")]
    InvalidArg { field: &'static str, reason: String },

    #[error("malformed telegram: {0}")]
    Parse(String),

    #[error("session is closed (poisoned by a prior timeout)")]
    Closed,

    #[error("no discovery beacon received before timeout")]
    DiscoveryTimeout,

    #[error("hub is shutting down, no new workers admitted")]
    HubShuttingDown,

    #[error("YAML config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub fn invalid_arg(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArg { field, reason: reason.into() }
    }
}
