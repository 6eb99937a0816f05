use bytes::Bytes;
use tether_core::{ClientId, Role, SessionCode};

/// Lifecycle notifications published by a coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The relay registered us in a session.
    SessionReady { code: SessionCode, role: Role },
    PeerJoined(ClientId),
    PeerLeft(ClientId),
    /// The direct path is usable.
    Connected,
    /// The data conduit opened; `send_data` delivers from here on.
    ChannelOpen,
    DataReceived(Bytes),
    Disconnected,
    Failed { reason: String },
    /// Something was ignored or could not be done. Never changes state.
    Diagnostic(String),
}
