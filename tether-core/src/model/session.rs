use serde::{Deserialize, Serialize};
use std::fmt;

/// Code handed out by the relay when a host creates a session.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SessionCode(pub String);

impl SessionCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the two-party handshake a participant plays.
///
/// Only the host produces the descriptor offer, only the client answers it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Client => write!(f, "client"),
        }
    }
}
