/// WebRTC settings for the direct transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
    /// Label of the data channel the host opens before offering.
    pub data_channel_label: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
            data_channel_label: "tether".to_owned(),
        }
    }
}
