use crate::error::RelayError;
use crate::relay::relay_channel::{RelayConnector, RelayEvent, RelayLink, RelaySender};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Relay channel over a WebSocket connection.
#[derive(Clone, Debug)]
pub struct WsRelayConnector {
    url: String,
}

impl WsRelayConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RelayConnector for WsRelayConnector {
    async fn open(&self) -> Result<RelayLink, RelayError> {
        let (socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        info!("Relay channel open: {}", self.url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let recv_task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(RelayEvent::Message(text.as_str().to_owned())).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay read error: {}", e);
                        break;
                    }
                }
            }
            debug!("Relay stream ended");
            let _ = in_tx.send(RelayEvent::Closed);
        });

        let sender = WsRelaySender { out_tx, recv_task };
        Ok(RelayLink::new(Box::new(sender), in_rx))
    }
}

struct WsRelaySender {
    out_tx: mpsc::UnboundedSender<Message>,
    recv_task: JoinHandle<()>,
}

#[async_trait]
impl RelaySender for WsRelaySender {
    async fn send(&self, text: String) -> Result<(), RelayError> {
        self.out_tx
            .send(Message::text(text))
            .map_err(|_| RelayError::Closed)
    }

    async fn close(&self) {
        if self.out_tx.send(Message::Close(None)).is_err() {
            return;
        }
        self.recv_task.abort();
    }
}

impl Drop for WsRelaySender {
    fn drop(&mut self) {
        // The send task drains out once `out_tx` is gone.
        self.recv_task.abort();
    }
}
