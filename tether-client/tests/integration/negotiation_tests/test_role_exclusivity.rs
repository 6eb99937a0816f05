use tether_client::ConnectionState;
use tether_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{EngineCall, TestSession, answer_from_client, offer_from_host};

#[tokio::test]
async fn test_host_never_answers() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (mut remote, engine) = session.connected_host().await;

    remote.deliver(offer_from_host());
    session.wait_for_diagnostic().await;

    assert!(
        !engine
            .calls()
            .iter()
            .any(|c| matches!(c, EngineCall::AcceptOffer(_)))
    );
    assert!(
        !remote
            .drain()
            .iter()
            .any(|m| matches!(m, SignalMessage::WebrtcAnswer { .. }))
    );
    assert_eq!(session.handle.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_client_never_offers() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (mut remote, engine) = session.connected_client().await;

    remote.deliver(answer_from_client());
    session.wait_for_diagnostic().await;

    assert!(!engine.has_call(&EngineCall::CreateOffer));
    assert!(
        !engine
            .calls()
            .iter()
            .any(|c| matches!(c, EngineCall::ApplyAnswer(_)))
    );
    assert!(
        !remote
            .drain()
            .iter()
            .any(|m| matches!(m, SignalMessage::WebrtcOffer { .. }))
    );
    assert_eq!(session.handle.state(), ConnectionState::Connected);
}
