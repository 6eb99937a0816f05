use crate::error::EngineError;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tether_core::IceCandidate;
use tokio::sync::mpsc;

/// The direct-transport engine a session drives.
///
/// Asynchronous callbacks (local candidates, path state, conduit data) are
/// delivered through the event sender handed to [`EngineFactory::create`].
#[async_trait]
pub trait TransportEngine: Send + Sync {
    /// Produce a local offer and install it as the local description.
    async fn create_offer(&self) -> Result<String, EngineError>;

    /// Install a remote offer, then produce and install the local answer.
    async fn accept_offer(&self, sdp: String) -> Result<String, EngineError>;

    /// Install the remote answer to a previously created offer.
    async fn apply_answer(&self, sdp: String) -> Result<(), EngineError>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError>;

    async fn is_channel_open(&self) -> bool;

    async fn send(&self, data: Bytes) -> Result<(), EngineError>;

    /// Release the data conduit.
    async fn close_channel(&self);

    /// Release the engine itself.
    async fn close(&self);
}

/// Creates a fresh engine for every session attempt.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn TransportEngine>, EngineError>;
}
