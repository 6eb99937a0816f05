use crate::error::StartError;
use crate::session::session_state::Session;
use bytes::Bytes;
use tokio::sync::oneshot;

/// Requests from a [`SessionHandle`](crate::SessionHandle) to the coordinator loop.
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        session: Session,
        reply: oneshot::Sender<Result<(), StartError>>,
    },
    SendData(Bytes),
    Disconnect {
        reply: oneshot::Sender<()>,
    },
}
