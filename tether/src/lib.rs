//! Two-party direct links brokered by a rendezvous relay.
//!
//! Enable `client` for the session coordinator, `server` for the relay.

pub use tether_core::{ClientId, IceCandidate, Role, SessionCode};

pub mod model {
    pub use tether_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use tether_client::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use tether_server::*;
}
