use crate::error::RelayError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// What the relay channel delivers to the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// One text frame, still undecoded.
    Message(String),
    /// The channel is gone, whoever closed it.
    Closed,
}

/// Outbound half of an open relay channel.
#[async_trait]
pub trait RelaySender: Send + Sync {
    async fn send(&self, text: String) -> Result<(), RelayError>;

    /// Close the channel. Safe to call more than once.
    async fn close(&self);
}

/// An open relay channel split into its two halves.
pub struct RelayLink {
    pub outbound: Box<dyn RelaySender>,
    pub inbound: mpsc::UnboundedReceiver<RelayEvent>,
}

impl RelayLink {
    pub fn new(
        outbound: Box<dyn RelaySender>,
        inbound: mpsc::UnboundedReceiver<RelayEvent>,
    ) -> Self {
        Self { outbound, inbound }
    }
}

/// Opens a fresh relay channel for every session attempt.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn open(&self) -> Result<RelayLink, RelayError>;
}
