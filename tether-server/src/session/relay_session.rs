use tether_core::{ClientId, SessionCode};
use tokio::time::Instant;

/// A session holds the host plus at most one client.
pub const MAX_MEMBERS: usize = 2;

#[derive(Debug, Clone)]
pub struct RelaySession {
    pub code: SessionCode,
    pub host_id: ClientId,
    pub members: Vec<ClientId>,
    pub created_at: Instant,
}

impl RelaySession {
    pub fn new(code: SessionCode, host_id: ClientId) -> Self {
        Self {
            code,
            members: vec![host_id.clone()],
            host_id,
            created_at: Instant::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_MEMBERS
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.members.contains(id)
    }

    /// The member that is not `id`.
    pub fn other_member(&self, id: &ClientId) -> Option<&ClientId> {
        self.members.iter().find(|m| *m != id)
    }
}
