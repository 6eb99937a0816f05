use crate::error::SignalingError;
use crate::session::relay_session::RelaySession;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::time::Duration;
use tether_core::{ClientId, SessionCode};
use tracing::info;

pub const CODE_LENGTH: usize = 6;
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random session code over `[0-9A-Z]`.
pub fn generate_code() -> SessionCode {
    let mut rng = rand::thread_rng();
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    SessionCode(code)
}

/// Live sessions keyed by code.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionCode, RelaySession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `host` under a fresh code unique among live sessions.
    pub fn create(&self, host: ClientId) -> SessionCode {
        loop {
            let code = generate_code();
            if let Entry::Vacant(slot) = self.sessions.entry(code.clone()) {
                slot.insert(RelaySession::new(code.clone(), host));
                info!("Session {} created", code);
                return code;
            }
        }
    }

    /// Add `client` to the session. Returns the host's id.
    pub fn join(&self, code: &SessionCode, client: ClientId) -> Result<ClientId, SignalingError> {
        let mut session = self
            .sessions
            .get_mut(code)
            .ok_or(SignalingError::SessionNotFound)?;
        if session.is_full() {
            return Err(SignalingError::SessionFull);
        }
        session.members.push(client);
        Ok(session.host_id.clone())
    }

    pub fn peer_of(&self, code: &SessionCode, id: &ClientId) -> Result<ClientId, SignalingError> {
        let session = self
            .sessions
            .get(code)
            .ok_or(SignalingError::SessionNotFound)?;
        if !session.contains(id) {
            return Err(SignalingError::NotInSession);
        }
        session
            .other_member(id)
            .cloned()
            .ok_or(SignalingError::NoPeer)
    }

    /// Drop `id` from the session and return who is left. An emptied
    /// session is removed.
    pub fn leave(&self, code: &SessionCode, id: &ClientId) -> Vec<ClientId> {
        let remaining = {
            let Some(mut session) = self.sessions.get_mut(code) else {
                return Vec::new();
            };
            session.members.retain(|m| m != id);
            session.members.clone()
        };

        if remaining.is_empty()
            && self
                .sessions
                .remove_if(code, |_, s| s.members.is_empty())
                .is_some()
        {
            info!("Session {} deleted", code);
        }
        remaining
    }

    /// Remove sessions older than `ttl` or without members.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            let keep = !session.members.is_empty() && session.created_at.elapsed() < ttl;
            if !keep {
                info!("Swept session {}", session.code);
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn contains(&self, code: &SessionCode) -> bool {
        self.sessions.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
