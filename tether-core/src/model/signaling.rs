use crate::model::candidate::IceCandidate;
use crate::model::peer::ClientId;
use crate::model::session::{Role, SessionCode};
use serde::{Deserialize, Serialize};

/// Every control message exchanged with the relay.
///
/// Serialized as a JSON object tagged by `type`, e.g.
/// `{"type":"join-session","sessionCode":"ABC123"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    CreateSession,
    JoinSession {
        session_code: SessionCode,
    },
    Connected {
        client_id: ClientId,
    },
    SessionCreated {
        session_code: SessionCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },
    SessionJoined {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_code: Option<SessionCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_id: Option<ClientId>,
    },
    ClientJoined {
        client_id: ClientId,
    },
    WebrtcOffer {
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ClientId>,
    },
    WebrtcAnswer {
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ClientId>,
    },
    IceCandidate {
        candidate: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ClientId>,
    },
    PeerDisconnected {
        client_id: ClientId,
    },
    Error {
        message: String,
    },
}

impl SignalMessage {
    /// The `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::CreateSession => "create-session",
            SignalMessage::JoinSession { .. } => "join-session",
            SignalMessage::Connected { .. } => "connected",
            SignalMessage::SessionCreated { .. } => "session-created",
            SignalMessage::SessionJoined { .. } => "session-joined",
            SignalMessage::ClientJoined { .. } => "client-joined",
            SignalMessage::WebrtcOffer { .. } => "webrtc-offer",
            SignalMessage::WebrtcAnswer { .. } => "webrtc-answer",
            SignalMessage::IceCandidate { .. } => "ice-candidate",
            SignalMessage::PeerDisconnected { .. } => "peer-disconnected",
            SignalMessage::Error { .. } => "error",
        }
    }

    pub fn join(session_code: SessionCode) -> Self {
        SignalMessage::JoinSession { session_code }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        SignalMessage::WebrtcOffer {
            sdp: sdp.into(),
            from: None,
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        SignalMessage::WebrtcAnswer {
            sdp: sdp.into(),
            from: None,
        }
    }

    pub fn candidate(candidate: &IceCandidate) -> Self {
        SignalMessage::IceCandidate {
            candidate: candidate.encode(),
            from: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SignalMessage::Error {
            message: message.into(),
        }
    }

    /// Stamp relayed peer-to-peer messages with their sender.
    pub fn with_sender(self, sender: ClientId) -> Self {
        match self {
            SignalMessage::WebrtcOffer { sdp, .. } => SignalMessage::WebrtcOffer {
                sdp,
                from: Some(sender),
            },
            SignalMessage::WebrtcAnswer { sdp, .. } => SignalMessage::WebrtcAnswer {
                sdp,
                from: Some(sender),
            },
            SignalMessage::IceCandidate { candidate, .. } => SignalMessage::IceCandidate {
                candidate,
                from: Some(sender),
            },
            other => other,
        }
    }

    /// Whether the relay forwards this message verbatim to the other member.
    pub fn is_peer_bound(&self) -> bool {
        matches!(
            self,
            SignalMessage::WebrtcOffer { .. }
                | SignalMessage::WebrtcAnswer { .. }
                | SignalMessage::IceCandidate { .. }
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
