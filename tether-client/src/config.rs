use crate::transport::TransportConfig;
use std::time::Duration;

pub const DEFAULT_RELAY_URL: &str = "ws://localhost:3000/ws";

/// Settings for one session coordinator.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// WebSocket URL of the rendezvous relay.
    pub relay_url: String,
    /// Upper bound for opening the relay channel.
    pub connect_timeout: Duration,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<String>) -> Self {
        self.transport.ice_servers = ice_servers;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_owned(),
            connect_timeout: Duration::from_secs(10),
            transport: TransportConfig::default(),
        }
    }
}
