use bytes::Bytes;
use tether_core::IceCandidate;

/// Events fed from the transport side into the session loop.
///
/// Engines emit the connectivity events from their callbacks; the
/// descriptor events are emitted when a request spawned by the coordinator
/// completes.
#[derive(Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Local offer produced (host).
    OfferReady(String),

    /// Remote offer applied and local answer produced (client).
    AnswerReady(String),

    /// Remote answer applied (host).
    RemoteAnswerApplied,

    /// Producing or applying a descriptor failed.
    NegotiationFailed(String),

    /// A local reachability candidate to trickle to the peer.
    LocalCandidate(IceCandidate),

    /// The direct path to the peer is usable.
    DirectPathReady,

    /// The data conduit opened.
    ChannelOpen,

    /// Bytes received over the data conduit.
    Message(Bytes),

    /// The direct path could not be established or broke irrecoverably.
    PathFailed,

    /// The direct path was closed.
    PathClosed,
}
