mod candidate_queue;
mod session_command;
mod session_coordinator;
mod session_event;
mod session_handle;
mod session_state;

pub use candidate_queue::*;
pub use session_command::*;
pub use session_coordinator::*;
pub use session_event::*;
pub use session_handle::*;
pub use session_state::*;
