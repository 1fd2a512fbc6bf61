//! Peer monitor error types.

use thiserror::Error;

/// Errors returned by peer monitor lifecycle operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("peer monitor already started: {0}")]
    AlreadyStarted(String),

    #[error("peer monitor has been shut down: {0}")]
    Stopped(String),

    #[error("no tokio runtime to start peer monitor {0} on")]
    NoRuntime(String),

    #[error("peer not monitored: {0}")]
    UnknownPeer(String),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
