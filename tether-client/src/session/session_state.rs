use std::fmt;
use tether_core::{ClientId, Role, SessionCode, SignalMessage};

/// Lifecycle of one session attempt.
///
/// Moves forward only. `Disconnected` and `Failed` are reached on teardown;
/// from `Disconnected` (or `Idle`) a new attempt may be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Idle,
    SignalingUp,
    AwaitingPeer,
    DescriptorExchange,
    CandidateExchange,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    pub fn can_start(self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Disconnected)
    }

    /// Whether an attempt holds relay or engine resources in this state.
    pub fn is_live(self) -> bool {
        !matches!(
            self,
            ConnectionState::Idle | ConnectionState::Disconnected | ConnectionState::Failed
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::SignalingUp => "signaling-up",
            ConnectionState::AwaitingPeer => "awaiting-peer",
            ConnectionState::DescriptorExchange => "descriptor-exchange",
            ConnectionState::CandidateExchange => "candidate-exchange",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Identity of one negotiation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
    pub session_code: Option<SessionCode>,
    pub local_id: ClientId,
    pub remote_id: Option<ClientId>,
}

impl Session {
    pub fn host(local_id: ClientId) -> Self {
        Self {
            role: Role::Host,
            session_code: None,
            local_id,
            remote_id: None,
        }
    }

    pub fn client(session_code: SessionCode, local_id: ClientId) -> Self {
        Self {
            role: Role::Client,
            session_code: Some(session_code),
            local_id,
            remote_id: None,
        }
    }

    pub fn is_remote(&self, id: &ClientId) -> bool {
        self.remote_id.as_ref() == Some(id)
    }

    /// First message sent once the relay channel is open.
    pub fn opening_message(&self) -> SignalMessage {
        match (&self.role, &self.session_code) {
            (Role::Client, Some(code)) => SignalMessage::join(code.clone()),
            _ => SignalMessage::CreateSession,
        }
    }
}
