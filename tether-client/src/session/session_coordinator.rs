use crate::config::ClientConfig;
use crate::error::{RelayError, StartError};
use crate::relay::{RelayConnector, RelayEvent, RelayLink, RelaySender, WsRelayConnector};
use crate::session::candidate_queue::CandidateQueue;
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionEvent;
use crate::session::session_handle::SessionHandle;
use crate::session::session_state::{ConnectionState, Session};
use crate::transport::{EngineFactory, TransportEngine, TransportEvent, WebRtcEngineFactory};
use bytes::Bytes;
use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ClientId, IceCandidate, Role, SignalMessage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type StartOutcome = Result<(Arc<dyn TransportEngine>, RelayLink), StartError>;

/// Where the offer/answer exchange stands for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negotiation {
    NotStarted,
    CreatingOffer,
    OfferSent,
    ApplyingAnswer,
    Answering,
    /// The remote descriptor is applied; candidates go straight to the engine.
    Complete,
}

struct PendingStart {
    session: Session,
    reply: oneshot::Sender<Result<(), StartError>>,
    cancel: oneshot::Sender<()>,
    outcome: oneshot::Receiver<StartOutcome>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
}

/// Resources owned by one live attempt.
struct Attempt {
    engine: Arc<dyn TransportEngine>,
    relay: Box<dyn RelaySender>,
    transport_tx: mpsc::Sender<TransportEvent>,
    tasks: Vec<JoinHandle<()>>,
    candidates: CandidateQueue,
    negotiation: Negotiation,
    path_ready_early: bool,
}

impl Attempt {
    async fn release(mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.candidates.clear();
        self.engine.close_channel().await;
        self.engine.close().await;
        self.relay.close().await;
    }
}

/// The connection state machine for one participant.
///
/// Runs as a single task: caller commands, relay frames and engine events
/// are handled one at a time, in the order each channel delivers them.
pub struct SessionCoordinator {
    config: ClientConfig,
    relay: Arc<dyn RelayConnector>,
    engines: Arc<dyn EngineFactory>,

    command_rx: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state_tx: watch::Sender<ConnectionState>,

    state: ConnectionState,
    session: Option<Session>,

    pending_start: Option<PendingStart>,
    attempt: Option<Attempt>,
    relay_rx: Option<mpsc::UnboundedReceiver<RelayEvent>>,
    transport_rx: Option<mpsc::Receiver<TransportEvent>>,
}

impl SessionCoordinator {
    /// Spawn a coordinator on the current runtime.
    pub fn spawn(
        config: ClientConfig,
        relay: Arc<dyn RelayConnector>,
        engines: Arc<dyn EngineFactory>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (events, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let coordinator = Self {
            config,
            relay,
            engines,
            command_rx,
            events,
            state_tx,
            state: ConnectionState::Idle,
            session: None,
            pending_start: None,
            attempt: None,
            relay_rx: None,
            transport_rx: None,
        };
        tokio::spawn(coordinator.run());

        (SessionHandle::new(command_tx, state_rx), events_rx)
    }

    /// Spawn a coordinator wired to a WebSocket relay and a WebRTC engine.
    pub fn spawn_webrtc(
        config: ClientConfig,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let relay = Arc::new(WsRelayConnector::new(config.relay_url.clone()));
        let engines = Arc::new(WebRtcEngineFactory::new(config.transport.clone()));
        Self::spawn(config, relay, engines)
    }

    async fn run(mut self) {
        info!("Session coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped. Shutting down.");
                            self.teardown(ConnectionState::Disconnected, None).await;
                            break;
                        }
                    }
                }

                outcome = recv_start(&mut self.pending_start) => {
                    self.finish_start(outcome).await;
                }

                evt = recv_relay(&mut self.relay_rx) => {
                    self.handle_relay_event(evt).await;
                }

                evt = recv_transport(&mut self.transport_rx) => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => self.transport_rx = None,
                    }
                }
            }
        }

        info!("Session coordinator finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Start { session, reply } => self.begin_start(session, reply),
            SessionCommand::SendData(data) => self.send_data(data).await,
            SessionCommand::Disconnect { reply } => {
                self.teardown(ConnectionState::Disconnected, None).await;
                let _ = reply.send(());
            }
        }
    }

    // ---- start ----

    fn begin_start(&mut self, session: Session, reply: oneshot::Sender<Result<(), StartError>>) {
        if self.pending_start.is_some() {
            let _ = reply.send(Err(StartError::AlreadyStarting));
            return;
        }
        if !self.state.can_start() {
            let _ = reply.send(Err(StartError::InvalidState(self.state)));
            return;
        }

        info!("Starting session as {}", session.role);

        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (outcome_tx, outcome) = oneshot::channel();
        let relay = self.relay.clone();
        let engines = self.engines.clone();
        let opening = session.opening_message();
        let timeout = self.config.connect_timeout;
        let events = transport_tx.clone();
        let (cancel, cancelled) = oneshot::channel();

        tokio::spawn(async move {
            let result = open_attempt(relay, engines, events, opening, timeout, cancelled).await;
            // Nobody is waiting any more: release what was opened.
            if let Err(Ok((engine, link))) = outcome_tx.send(result) {
                release_opened(engine, link).await;
            }
        });

        self.pending_start = Some(PendingStart {
            session,
            reply,
            cancel,
            outcome,
            transport_tx,
            transport_rx,
        });
    }

    async fn finish_start(&mut self, outcome: Result<StartOutcome, oneshot::error::RecvError>) {
        let Some(pending) = self.pending_start.take() else {
            return;
        };
        let outcome = outcome.unwrap_or(Err(StartError::Cancelled));

        match outcome {
            Ok((engine, link)) => {
                let RelayLink { outbound, inbound } = link;
                self.attempt = Some(Attempt {
                    engine,
                    relay: outbound,
                    transport_tx: pending.transport_tx,
                    tasks: Vec::new(),
                    candidates: CandidateQueue::new(),
                    negotiation: Negotiation::NotStarted,
                    path_ready_early: false,
                });
                self.relay_rx = Some(inbound);
                self.transport_rx = Some(pending.transport_rx);
                self.session = Some(pending.session);
                self.set_state(ConnectionState::SignalingUp);
                let _ = pending.reply.send(Ok(()));
            }
            Err(e) => {
                self.diagnostic(format!("Start failed: {}", e));
                let _ = pending.reply.send(Err(e));
            }
        }
    }

    // ---- relay ----

    async fn handle_relay_event(&mut self, evt: Option<RelayEvent>) {
        match evt {
            Some(RelayEvent::Message(text)) => match SignalMessage::from_json(&text) {
                Ok(msg) => self.handle_signal(msg).await,
                Err(e) => self.diagnostic(format!("Malformed relay message: {}", e)),
            },
            Some(RelayEvent::Closed) | None => {
                info!("Relay channel closed");
                self.relay_rx = None;
                self.teardown(ConnectionState::Disconnected, None).await;
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        let Some(role) = self.session.as_ref().map(|s| s.role) else {
            return;
        };
        let state = self.state;

        match msg {
            SignalMessage::Connected { client_id } if state == ConnectionState::SignalingUp => {
                info!("Relay assigned id {}", client_id);
                if let Some(session) = self.session.as_mut() {
                    session.local_id = client_id;
                }
            }

            SignalMessage::SessionCreated { session_code, .. }
                if state == ConnectionState::SignalingUp && role == Role::Host =>
            {
                info!("Session {} created", session_code);
                if let Some(session) = self.session.as_mut() {
                    session.session_code = Some(session_code.clone());
                }
                self.set_state(ConnectionState::AwaitingPeer);
                self.emit(SessionEvent::SessionReady {
                    code: session_code,
                    role,
                });
            }

            SignalMessage::SessionJoined {
                session_code,
                host_id,
                ..
            } if state == ConnectionState::SignalingUp && role == Role::Client => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if let Some(code) = session_code {
                    session.session_code = Some(code);
                }
                if let Some(host) = host_id.as_ref() {
                    session.remote_id = Some(host.clone());
                }
                let code = session.session_code.clone();

                self.set_state(ConnectionState::AwaitingPeer);
                if let Some(code) = code {
                    info!("Joined session {}", code);
                    self.emit(SessionEvent::SessionReady { code, role });
                }
                if let Some(host) = host_id {
                    self.emit(SessionEvent::PeerJoined(host));
                }
            }

            SignalMessage::Error { message } if state == ConnectionState::SignalingUp => {
                self.diagnostic(format!("Relay error: {}", message));
                self.teardown(ConnectionState::Failed, Some(message)).await;
            }

            SignalMessage::Error { message } => {
                self.diagnostic(format!("Relay error: {}", message));
            }

            SignalMessage::ClientJoined { client_id } if role == Role::Host => {
                self.handle_client_joined(client_id).await;
            }

            SignalMessage::WebrtcOffer { sdp, from } if role == Role::Client => {
                if !self.accepts_sender(&from, "webrtc-offer") {
                    return;
                }
                let ready = matches!(
                    state,
                    ConnectionState::AwaitingPeer | ConnectionState::DescriptorExchange
                ) && self.negotiation() == Some(Negotiation::NotStarted);
                if !ready {
                    self.violation("webrtc-offer");
                    return;
                }

                let unbound = self.session.as_ref().is_some_and(|s| s.remote_id.is_none());
                if let (true, Some(host)) = (unbound, from) {
                    if let Some(session) = self.session.as_mut() {
                        session.remote_id = Some(host.clone());
                    }
                    self.emit(SessionEvent::PeerJoined(host));
                }
                self.set_negotiation(Negotiation::Answering);
                self.set_state(ConnectionState::DescriptorExchange);
                self.spawn_request(|engine| async move {
                    match engine.accept_offer(sdp).await {
                        Ok(answer) => TransportEvent::AnswerReady(answer),
                        Err(e) => TransportEvent::NegotiationFailed(e.to_string()),
                    }
                });
            }

            SignalMessage::WebrtcAnswer { sdp, from } if role == Role::Host => {
                if !self.accepts_sender(&from, "webrtc-answer") {
                    return;
                }
                if state != ConnectionState::DescriptorExchange
                    || self.negotiation() != Some(Negotiation::OfferSent)
                {
                    self.violation("webrtc-answer");
                    return;
                }

                self.set_negotiation(Negotiation::ApplyingAnswer);
                self.spawn_request(|engine| async move {
                    match engine.apply_answer(sdp).await {
                        Ok(()) => TransportEvent::RemoteAnswerApplied,
                        Err(e) => TransportEvent::NegotiationFailed(e.to_string()),
                    }
                });
            }

            SignalMessage::IceCandidate { candidate, from } => {
                if !self.accepts_sender(&from, "ice-candidate") {
                    return;
                }
                self.handle_remote_candidate(&candidate).await;
            }

            SignalMessage::PeerDisconnected { client_id } => {
                let bound = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.is_remote(&client_id));
                if bound && state.is_live() {
                    info!("Peer {} left", client_id);
                    self.emit(SessionEvent::PeerLeft(client_id));
                    self.teardown(ConnectionState::Disconnected, None).await;
                } else {
                    self.diagnostic(format!("Ignored peer-disconnected for {}", client_id));
                }
            }

            other => self.violation(other.kind()),
        }
    }

    async fn handle_client_joined(&mut self, client_id: ClientId) {
        let Some(bound) = self.session.as_ref().map(|s| s.remote_id.clone()) else {
            return;
        };

        match bound {
            Some(bound) if bound == client_id => {
                debug!("Repeated client-joined for {}", client_id);
                return;
            }
            Some(bound) => {
                self.diagnostic(format!(
                    "Rejected client-joined for {}: already paired with {}",
                    client_id, bound
                ));
                return;
            }
            None if self.state != ConnectionState::AwaitingPeer => {
                self.violation("client-joined");
                return;
            }
            None => {}
        }

        info!("Peer {} joined", client_id);
        if let Some(session) = self.session.as_mut() {
            session.remote_id = Some(client_id.clone());
        }
        self.emit(SessionEvent::PeerJoined(client_id));

        self.set_negotiation(Negotiation::CreatingOffer);
        self.set_state(ConnectionState::DescriptorExchange);
        self.spawn_request(|engine| async move {
            match engine.create_offer().await {
                Ok(offer) => TransportEvent::OfferReady(offer),
                Err(e) => TransportEvent::NegotiationFailed(e.to_string()),
            }
        });
    }

    async fn handle_remote_candidate(&mut self, encoded: &str) {
        let accepted = match self.state {
            ConnectionState::DescriptorExchange
            | ConnectionState::CandidateExchange
            | ConnectionState::Connected => true,
            ConnectionState::AwaitingPeer => {
                self.session.as_ref().map(|s| s.role) == Some(Role::Client)
            }
            _ => false,
        };
        if !accepted {
            self.violation("ice-candidate");
            return;
        }

        let candidate: IceCandidate = match encoded.parse() {
            Ok(c) => c,
            Err(e) => {
                self.diagnostic(format!("Malformed candidate '{}': {}", encoded, e));
                return;
            }
        };

        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.negotiation == Negotiation::Complete {
            if let Err(e) = attempt.engine.add_remote_candidate(candidate).await {
                warn!("Engine rejected remote candidate: {}", e);
            }
        } else {
            debug!("Queueing candidate until the remote descriptor is applied");
            attempt.candidates.enqueue(candidate);
        }
    }

    // ---- transport ----

    async fn handle_transport_event(&mut self, evt: TransportEvent) {
        if !self.state.is_live() {
            debug!("Dropping transport event after teardown: {:?}", evt);
            return;
        }

        match evt {
            TransportEvent::OfferReady(sdp) => {
                if self.negotiation() != Some(Negotiation::CreatingOffer) {
                    return;
                }
                if self.send_signal(SignalMessage::offer(sdp)).await {
                    self.set_negotiation(Negotiation::OfferSent);
                }
            }
            TransportEvent::AnswerReady(sdp) => {
                if self.negotiation() != Some(Negotiation::Answering) {
                    return;
                }
                if self.send_signal(SignalMessage::answer(sdp)).await {
                    self.complete_negotiation().await;
                }
            }
            TransportEvent::RemoteAnswerApplied => {
                if self.negotiation() == Some(Negotiation::ApplyingAnswer) {
                    self.complete_negotiation().await;
                }
            }
            TransportEvent::NegotiationFailed(reason) => {
                self.diagnostic(format!("Descriptor negotiation failed: {}", reason));
                self.teardown(ConnectionState::Failed, Some(reason)).await;
            }
            TransportEvent::LocalCandidate(candidate) => {
                if matches!(
                    self.state,
                    ConnectionState::DescriptorExchange
                        | ConnectionState::CandidateExchange
                        | ConnectionState::Connected
                ) {
                    self.send_signal(SignalMessage::candidate(&candidate)).await;
                }
            }
            TransportEvent::DirectPathReady => match self.state {
                ConnectionState::CandidateExchange => self.mark_connected().await,
                ConnectionState::DescriptorExchange => {
                    if let Some(attempt) = self.attempt.as_mut() {
                        attempt.path_ready_early = true;
                    }
                }
                _ => {}
            },
            TransportEvent::ChannelOpen => self.emit(SessionEvent::ChannelOpen),
            TransportEvent::Message(data) => self.emit(SessionEvent::DataReceived(data)),
            TransportEvent::PathFailed => {
                self.diagnostic("Direct path failed".to_owned());
                self.teardown(ConnectionState::Failed, Some("direct path failed".to_owned()))
                    .await;
            }
            TransportEvent::PathClosed => {
                info!("Direct path closed");
                self.teardown(ConnectionState::Disconnected, None).await;
            }
        }
    }

    async fn complete_negotiation(&mut self) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        attempt.negotiation = Negotiation::Complete;
        attempt.candidates.drain_into(attempt.engine.as_ref()).await;
        let early = attempt.path_ready_early;

        self.set_state(ConnectionState::CandidateExchange);
        if early {
            self.mark_connected().await;
        }
    }

    async fn mark_connected(&mut self) {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.candidates.drain_into(attempt.engine.as_ref()).await;
        }
        self.set_state(ConnectionState::Connected);
        self.emit(SessionEvent::Connected);
    }

    // ---- data ----

    async fn send_data(&mut self, data: Bytes) {
        if self.state != ConnectionState::Connected {
            self.diagnostic(format!(
                "Dropped {} bytes: not connected ({})",
                data.len(),
                self.state
            ));
            return;
        }
        let Some(engine) = self.attempt.as_ref().map(|a| a.engine.clone()) else {
            return;
        };
        if !engine.is_channel_open().await {
            self.diagnostic(format!("Dropped {} bytes: data channel not open", data.len()));
            return;
        }
        if let Err(e) = engine.send(data).await {
            self.diagnostic(format!("Data send failed: {}", e));
        }
    }

    // ---- teardown ----

    async fn teardown(&mut self, next: ConnectionState, reason: Option<String>) {
        let was_live = self.state.is_live() || self.pending_start.is_some();

        if let Some(pending) = self.pending_start.take() {
            let _ = pending.cancel.send(());
            // The open task stops at its next step and closes what it built.
            // An outcome that completed first is released here.
            if let Ok(Ok((engine, link))) = pending.outcome.await {
                release_opened(engine, link).await;
            }
            let _ = pending.reply.send(Err(StartError::Cancelled));
        }
        if let Some(attempt) = self.attempt.take() {
            attempt.release().await;
        }
        self.relay_rx = None;
        self.transport_rx = None;

        if !was_live {
            return;
        }

        self.set_state(next);
        match next {
            ConnectionState::Failed => self.emit(SessionEvent::Failed {
                reason: reason.unwrap_or_else(|| "unknown".to_owned()),
            }),
            _ => self.emit(SessionEvent::Disconnected),
        }
    }

    // ---- helpers ----

    fn negotiation(&self) -> Option<Negotiation> {
        self.attempt.as_ref().map(|a| a.negotiation)
    }

    fn set_negotiation(&mut self, negotiation: Negotiation) {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.negotiation = negotiation;
        }
    }

    /// Run an engine request off the loop; its result comes back as a transport event.
    fn spawn_request<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(Arc<dyn TransportEngine>) -> Fut,
        Fut: Future<Output = TransportEvent> + Send + 'static,
    {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        let fut = request(attempt.engine.clone());
        let tx = attempt.transport_tx.clone();
        attempt.tasks.push(tokio::spawn(async move {
            let evt = fut.await;
            let _ = tx.send(evt).await;
        }));
    }

    async fn send_signal(&mut self, msg: SignalMessage) -> bool {
        let Some(attempt) = self.attempt.as_ref() else {
            return false;
        };
        let result = match msg.to_json() {
            Ok(text) => attempt
                .relay
                .send(text)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => {
                debug!("Sent {}", msg.kind());
                true
            }
            Err(e) => {
                self.diagnostic(format!("Failed to send {}: {}", msg.kind(), e));
                false
            }
        }
    }

    fn accepts_sender(&self, from: &Option<ClientId>, kind: &str) -> bool {
        let (Some(from), Some(session)) = (from, self.session.as_ref()) else {
            return true;
        };
        match session.remote_id.as_ref() {
            Some(remote) if remote != from => {
                self.diagnostic(format!("Ignored {} from unknown sender {}", kind, from));
                false
            }
            _ => true,
        }
    }

    fn violation(&self, kind: &str) {
        let role = self.session.as_ref().map(|s| s.role);
        let text = match role {
            Some(role) => format!("Ignored {} as {} in state {}", kind, role, self.state),
            None => format!("Ignored {} in state {}", kind, self.state),
        };
        self.diagnostic(text);
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        info!("Session state: {} -> {}", self.state, next);
        self.state = next;
        self.state_tx.send_replace(next);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn diagnostic(&self, text: String) {
        warn!("{}", text);
        self.emit(SessionEvent::Diagnostic(text));
    }
}

async fn open_attempt(
    relay: Arc<dyn RelayConnector>,
    engines: Arc<dyn EngineFactory>,
    events: mpsc::Sender<TransportEvent>,
    opening: SignalMessage,
    timeout: Duration,
    mut cancelled: oneshot::Receiver<()>,
) -> StartOutcome {
    let text = opening
        .to_json()
        .map_err(|e| StartError::Relay(RelayError::SendFailed(e.to_string())))?;

    let engine = tokio::select! {
        _ = &mut cancelled => return Err(StartError::Cancelled),
        created = engines.create(events) => created.map_err(StartError::Engine)?,
    };

    let opened = tokio::select! {
        _ = &mut cancelled => {
            engine.close().await;
            return Err(StartError::Cancelled);
        }
        opened = tokio::time::timeout(timeout, relay.open()) => opened,
    };
    let link = match opened {
        Ok(Ok(link)) => link,
        Ok(Err(e)) => {
            engine.close().await;
            return Err(StartError::Relay(e));
        }
        Err(_) => {
            engine.close().await;
            return Err(StartError::Relay(RelayError::Timeout(timeout)));
        }
    };

    if let Err(e) = link.outbound.send(text).await {
        link.outbound.close().await;
        engine.close().await;
        return Err(StartError::Relay(e));
    }
    debug!("Sent {}", opening.kind());

    Ok((engine, link))
}

async fn release_opened(engine: Arc<dyn TransportEngine>, link: RelayLink) {
    engine.close_channel().await;
    engine.close().await;
    link.outbound.close().await;
}

async fn recv_start(
    start: &mut Option<PendingStart>,
) -> Result<StartOutcome, oneshot::error::RecvError> {
    match start {
        Some(p) => (&mut p.outcome).await,
        None => pending().await,
    }
}

async fn recv_relay(rx: &mut Option<mpsc::UnboundedReceiver<RelayEvent>>) -> Option<RelayEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn recv_transport(
    rx: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}
