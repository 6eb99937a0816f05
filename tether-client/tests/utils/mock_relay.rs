use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_client::{RelayConnector, RelayError, RelayEvent, RelayLink, RelaySender};
use tether_core::SignalMessage;
use tokio::sync::mpsc;

use super::ReleaseLog;

/// How the next `open()` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Accept,
    Refuse,
    /// Never completes; only a timeout or an abort gets the caller out.
    Hang,
}

/// In-memory relay. Every accepted `open()` yields a [`MockRelayRemote`]
/// playing the rendezvous side of that channel.
#[derive(Clone)]
pub struct MockRelayConnector {
    behavior: Arc<Mutex<OpenBehavior>>,
    opens: Arc<AtomicUsize>,
    remotes_tx: mpsc::UnboundedSender<MockRelayRemote>,
    log: ReleaseLog,
}

impl MockRelayConnector {
    pub fn new(log: ReleaseLog) -> (Self, mpsc::UnboundedReceiver<MockRelayRemote>) {
        let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
        let connector = Self {
            behavior: Arc::new(Mutex::new(OpenBehavior::Accept)),
            opens: Arc::new(AtomicUsize::new(0)),
            remotes_tx,
            log,
        };
        (connector, remotes_rx)
    }

    pub fn set_behavior(&self, behavior: OpenBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayConnector for MockRelayConnector {
    async fn open(&self) -> Result<RelayLink, RelayError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();

        match behavior {
            OpenBehavior::Refuse => Err(RelayError::Unreachable("connection refused".into())),
            OpenBehavior::Hang => std::future::pending().await,
            OpenBehavior::Accept => {
                let (to_client, inbound) = mpsc::unbounded_channel();
                let (outbound_tx, from_client) = mpsc::unbounded_channel();
                let closed = Arc::new(AtomicBool::new(false));

                let sender = MockRelaySender {
                    tx: outbound_tx,
                    closed: closed.clone(),
                    log: self.log.clone(),
                };
                let remote = MockRelayRemote {
                    to_client,
                    from_client,
                    closed,
                };
                let _ = self.remotes_tx.send(remote);

                Ok(RelayLink::new(Box::new(sender), inbound))
            }
        }
    }
}

struct MockRelaySender {
    tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
    log: ReleaseLog,
}

#[async_trait]
impl RelaySender for MockRelaySender {
    async fn send(&self, text: String) -> Result<(), RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Closed);
        }
        self.tx.send(text).map_err(|_| RelayError::Closed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.log.push("relay_close");
    }
}

/// Rendezvous end of one mock relay channel.
pub struct MockRelayRemote {
    to_client: mpsc::UnboundedSender<RelayEvent>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl MockRelayRemote {
    pub fn deliver(&self, msg: SignalMessage) {
        let text = msg.to_json().unwrap();
        let _ = self.to_client.send(RelayEvent::Message(text));
    }

    pub fn deliver_raw(&self, text: &str) {
        let _ = self.to_client.send(RelayEvent::Message(text.to_owned()));
    }

    /// Simulate the relay dropping the channel.
    pub fn close(&self) {
        let _ = self.to_client.send(RelayEvent::Closed);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Next message the coordinator sent to the relay.
    pub async fn next_message(&mut self) -> SignalMessage {
        let text = tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("Timed out waiting for a relay message")
            .expect("Relay channel dropped");
        SignalMessage::from_json(&text).unwrap()
    }

    /// Everything sent so far that has not been read yet.
    pub fn drain(&mut self) -> Vec<SignalMessage> {
        let mut messages = Vec::new();
        while let Ok(text) = self.from_client.try_recv() {
            messages.push(SignalMessage::from_json(&text).unwrap());
        }
        messages
    }
}
