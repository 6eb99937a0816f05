use crate::error::EngineError;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_engine::{EngineFactory, TransportEngine};
use crate::transport::transport_event::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tether_core::IceCandidate;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// [`TransportEngine`] backed by a webrtc-rs peer connection.
pub struct ConnectionWrapper {
    peer_connection: Arc<RTCPeerConnection>,
    data_channel: Arc<RwLock<Option<Arc<RTCDataChannel>>>>,
    event_tx: mpsc::Sender<TransportEvent>,
    config: TransportConfig,
}

impl ConnectionWrapper {
    /// Build a peer connection and wire its callbacks into `event_tx`.
    pub async fn new(
        config: TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, EngineError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers.clone(),
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let data_channel: Arc<RwLock<Option<Arc<RTCDataChannel>>>> = Arc::new(RwLock::new(None));

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    if let Some(event) = path_event(s) {
                        let _ = tx.send(event).await;
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate::new(
                    init.candidate,
                    init.sdp_mline_index.unwrap_or(0),
                    init.sdp_mid.unwrap_or_default(),
                );
                let _ = tx.send(TransportEvent::LocalCandidate(candidate)).await;
            })
        }));

        // The answering side adopts the channel the offerer created.
        let dc_tx = event_tx.clone();
        let dc_slot = data_channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = dc_slot.clone();

            Box::pin(async move {
                debug!("Remote announced data channel '{}'", dc.label());
                wire_data_channel(&dc, tx);
                *slot.write().await = Some(dc);
            })
        }));

        Ok(Self {
            peer_connection,
            data_channel,
            event_tx,
            config,
        })
    }
}

/// Only `Connected`, `Failed` and `Closed` reach the session. ICE may still
/// recover from `Disconnected`, and gives up through `Failed` when it cannot.
fn path_event(state: RTCPeerConnectionState) -> Option<TransportEvent> {
    match state {
        RTCPeerConnectionState::Connected => Some(TransportEvent::DirectPathReady),
        RTCPeerConnectionState::Failed => Some(TransportEvent::PathFailed),
        RTCPeerConnectionState::Closed => Some(TransportEvent::PathClosed),
        RTCPeerConnectionState::Disconnected => {
            debug!("Direct path interrupted, waiting for ICE to recover");
            None
        }
        _ => None,
    }
}

fn wire_data_channel(dc: &Arc<RTCDataChannel>, tx: mpsc::Sender<TransportEvent>) {
    let label = dc.label().to_owned();
    let open_tx = tx.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let label = label.clone();

        Box::pin(async move {
            info!("Data channel '{}' open", label);
            let _ = tx.send(TransportEvent::ChannelOpen).await;
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(msg.data)).await;
        })
    }));
}

#[async_trait]
impl TransportEngine for ConnectionWrapper {
    async fn create_offer(&self) -> Result<String, EngineError> {
        let dc = self
            .peer_connection
            .create_data_channel(&self.config.data_channel_label, None)
            .await?;
        wire_data_channel(&dc, self.event_tx.clone());
        *self.data_channel.write().await = Some(dc);

        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, EngineError> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: String) -> Result<(), EngineError> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.content,
            sdp_mid: (!candidate.sdp_mid.is_empty()).then_some(candidate.sdp_mid),
            sdp_mline_index: Some(candidate.sdp_mline_index),
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn is_channel_open(&self) -> bool {
        self.data_channel
            .read()
            .await
            .as_ref()
            .is_some_and(|dc| dc.ready_state() == RTCDataChannelState::Open)
    }

    async fn send(&self, data: Bytes) -> Result<(), EngineError> {
        let dc = self
            .data_channel
            .read()
            .await
            .clone()
            .ok_or(EngineError::ChannelNotOpen)?;
        dc.send(&data).await?;
        Ok(())
    }

    async fn close_channel(&self) {
        let Some(dc) = self.data_channel.write().await.take() else {
            return;
        };
        if let Err(e) = dc.close().await {
            warn!("Failed to close data channel: {}", e);
        }
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }
}

/// Builds a new [`ConnectionWrapper`] per session attempt.
#[derive(Clone, Debug, Default)]
pub struct WebRtcEngineFactory {
    config: TransportConfig,
}

impl WebRtcEngineFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for WebRtcEngineFactory {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn TransportEngine>, EngineError> {
        let engine = ConnectionWrapper::new(self.config.clone(), events).await?;
        Ok(Arc::new(engine))
    }
}
