use thiserror::Error;

/// Request failures reported back to the offending client as `error{message}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("Invalid message")]
    InvalidMessage,
    #[error("Unexpected message")]
    UnexpectedMessage,
    #[error("Session not found")]
    SessionNotFound,
    #[error("Session full")]
    SessionFull,
    #[error("Already in a session")]
    AlreadyInSession,
    #[error("Not in a session")]
    NotInSession,
    #[error("No peer in session")]
    NoPeer,
}
