use crate::error::SignalingError;
use crate::session::SessionRegistry;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tether_core::{ClientId, Role, SessionCode, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

struct ClientEntry {
    tx: mpsc::UnboundedSender<Message>,
    session_code: Option<SessionCode>,
}

struct SignalingInner {
    clients: DashMap<ClientId, ClientEntry>,
    sessions: Arc<SessionRegistry>,
}

/// Connected clients plus the session registry.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                clients: DashMap::new(),
                sessions: Arc::new(SessionRegistry::new()),
            }),
        }
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        self.inner.sessions.clone()
    }

    pub fn client_count(&self) -> usize {
        self.inner.clients.len()
    }

    /// Register a socket and greet it with its id.
    pub fn add_client(&self, client_id: ClientId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.clients.insert(
            client_id.clone(),
            ClientEntry {
                tx,
                session_code: None,
            },
        );
        self.send_signal(&client_id, SignalMessage::Connected { client_id: client_id.clone() });
    }

    /// Forget a socket. The other member of its session, if any, learns
    /// about it through `peer-disconnected`.
    pub fn remove_client(&self, client_id: &ClientId) {
        let Some((_, entry)) = self.inner.clients.remove(client_id) else {
            return;
        };
        let Some(code) = entry.session_code else {
            return;
        };

        for other in self.inner.sessions.leave(&code, client_id) {
            self.send_signal(
                &other,
                SignalMessage::PeerDisconnected {
                    client_id: client_id.clone(),
                },
            );
        }
    }

    pub fn send_signal(&self, client_id: &ClientId, msg: SignalMessage) {
        let Some(client) = self.inner.clients.get(client_id) else {
            warn!("Attempted to send {} to disconnected client {}", msg.kind(), client_id);
            return;
        };
        match msg.to_json() {
            Ok(json) => {
                if let Err(e) = client.tx.send(Message::Text(json.into())) {
                    error!("Failed to queue WS message for {}: {}", client_id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    /// Handle one text frame from `client_id`, replying with `error` when
    /// the request cannot be served.
    pub fn handle_text(&self, client_id: &ClientId, text: &str) {
        let result = match SignalMessage::from_json(text) {
            Ok(msg) => self.handle_signal(client_id, msg),
            Err(e) => {
                warn!("Invalid SignalMessage from {}: {}", client_id, e);
                Err(SignalingError::InvalidMessage)
            }
        };

        if let Err(e) = result {
            debug!("Rejecting request from {}: {}", client_id, e);
            self.send_signal(client_id, SignalMessage::error(e.to_string()));
        }
    }

    fn handle_signal(&self, client_id: &ClientId, msg: SignalMessage) -> Result<(), SignalingError> {
        match msg {
            SignalMessage::CreateSession => self.create_session(client_id),
            SignalMessage::JoinSession { session_code } => self.join_session(client_id, session_code),
            msg if msg.is_peer_bound() => self.forward(client_id, msg),
            other => {
                warn!("Unexpected {} from {}", other.kind(), client_id);
                Err(SignalingError::UnexpectedMessage)
            }
        }
    }

    fn current_session(&self, client_id: &ClientId) -> Option<SessionCode> {
        self.inner
            .clients
            .get(client_id)
            .and_then(|c| c.session_code.clone())
    }

    fn bind_session(&self, client_id: &ClientId, code: &SessionCode) {
        if let Some(mut client) = self.inner.clients.get_mut(client_id) {
            client.session_code = Some(code.clone());
        }
    }

    fn create_session(&self, client_id: &ClientId) -> Result<(), SignalingError> {
        if self.current_session(client_id).is_some() {
            return Err(SignalingError::AlreadyInSession);
        }

        let code = self.inner.sessions.create(client_id.clone());
        self.bind_session(client_id, &code);
        info!("Client {} hosts session {}", client_id, code);

        self.send_signal(
            client_id,
            SignalMessage::SessionCreated {
                session_code: code,
                role: Some(Role::Host),
            },
        );
        Ok(())
    }

    fn join_session(&self, client_id: &ClientId, code: SessionCode) -> Result<(), SignalingError> {
        if self.current_session(client_id).is_some() {
            return Err(SignalingError::AlreadyInSession);
        }

        let host_id = self.inner.sessions.join(&code, client_id.clone())?;
        self.bind_session(client_id, &code);
        info!("Client {} joined session {}", client_id, code);

        self.send_signal(
            client_id,
            SignalMessage::SessionJoined {
                session_code: Some(code),
                role: Some(Role::Client),
                host_id: Some(host_id.clone()),
            },
        );
        self.send_signal(
            &host_id,
            SignalMessage::ClientJoined {
                client_id: client_id.clone(),
            },
        );
        Ok(())
    }

    fn forward(&self, client_id: &ClientId, msg: SignalMessage) -> Result<(), SignalingError> {
        let code = self
            .current_session(client_id)
            .ok_or(SignalingError::NotInSession)?;
        let peer = self.inner.sessions.peer_of(&code, client_id)?;

        debug!("Forwarding {} from {} to {}", msg.kind(), client_id, peer);
        self.send_signal(&peer, msg.with_sender(client_id.clone()));
        Ok(())
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}
