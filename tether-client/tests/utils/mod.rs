pub mod mock_relay;

pub use live_relay::*;
pub use mock_engine::*;
pub use mock_relay::*;
pub use session_helpers::*;
