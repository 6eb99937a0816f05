use crate::session::ConnectionState;
use std::time::Duration;
use thiserror::Error;

/// Failures of the relay channel.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay unreachable: {0}")]
    Unreachable(String),
    #[error("timed out after {0:?} opening the relay channel")]
    Timeout(Duration),
    #[error("relay channel closed")]
    Closed,
    #[error("failed to send to relay: {0}")]
    SendFailed(String),
}

/// Failures reported by a transport engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),
    #[error("data channel is not open")]
    ChannelNotOpen,
    #[error("transport engine is closed")]
    Closed,
    #[error("{0}")]
    Other(String),
}

/// Why `start_as_host` / `start_as_client` did not get the session going.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("cannot start while {0}")]
    InvalidState(ConnectionState),
    #[error("another start is already pending")]
    AlreadyStarting,
    #[error("transport engine failed to initialise: {0}")]
    Engine(#[source] EngineError),
    #[error("relay channel could not be opened: {0}")]
    Relay(#[source] RelayError),
    #[error("start cancelled by disconnect")]
    Cancelled,
    #[error("session coordinator is not running")]
    CoordinatorGone,
}
