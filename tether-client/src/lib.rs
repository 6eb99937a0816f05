//! Client side of a two-party tether: drives one direct peer-to-peer link
//! through relay-assisted signaling.
//!
//! A [`SessionCoordinator`] owns the connection state machine and runs as a
//! single tokio task. Callers talk to it through a [`SessionHandle`] and
//! observe it through a stream of [`SessionEvent`]s.

mod config;
mod error;
pub mod relay;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use error::{EngineError, RelayError, StartError};
pub use relay::*;
pub use session::*;
pub use transport::*;

pub use tether_core::{ClientId, IceCandidate, Role, SessionCode, SignalMessage};
