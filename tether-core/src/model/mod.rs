mod candidate;
mod peer;
mod session;
mod signaling;

pub use candidate::{CandidateParseError, IceCandidate};
pub use peer::ClientId;
pub use session::{Role, SessionCode};
pub use signaling::SignalMessage;
