mod relay_session;
mod session_registry;
mod session_sweeper;

pub use relay_session::*;
pub use session_registry::*;
pub use session_sweeper::*;
