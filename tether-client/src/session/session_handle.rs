use crate::error::StartError;
use crate::session::session_command::SessionCommand;
use crate::session::session_state::{ConnectionState, Session};
use bytes::Bytes;
use tether_core::{ClientId, SessionCode};
use tokio::sync::{mpsc, oneshot, watch};

/// Caller side of a running [`SessionCoordinator`](crate::SessionCoordinator).
///
/// Cheap to clone. The coordinator shuts down once every handle is dropped.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            command_tx,
            state_rx,
        }
    }

    /// Open the relay and ask it for a new session.
    ///
    /// Resolves once `create-session` is on the wire. The code arrives later
    /// as [`SessionEvent::SessionReady`](crate::SessionEvent::SessionReady).
    pub async fn start_as_host(&self, local_id: ClientId) -> Result<(), StartError> {
        self.start(Session::host(local_id)).await
    }

    /// Open the relay and join the session identified by `code`.
    pub async fn start_as_client(
        &self,
        code: SessionCode,
        local_id: ClientId,
    ) -> Result<(), StartError> {
        self.start(Session::client(code, local_id)).await
    }

    async fn start(&self, session: Session) -> Result<(), StartError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Start { session, reply })
            .await
            .map_err(|_| StartError::CoordinatorGone)?;
        rx.await.map_err(|_| StartError::CoordinatorGone)?
    }

    /// Send over the data conduit. Dropped with a diagnostic unless connected.
    pub async fn send_data(&self, data: impl Into<Bytes>) {
        let _ = self
            .command_tx
            .send(SessionCommand::SendData(data.into()))
            .await;
    }

    /// Tear the current attempt down. Does nothing when nothing is live.
    pub async fn disconnect(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .command_tx
            .send(SessionCommand::Disconnect { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}
