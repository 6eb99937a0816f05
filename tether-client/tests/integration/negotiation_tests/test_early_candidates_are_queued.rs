use tether_client::{ConnectionState, SessionEvent};
use tether_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{
    CLIENT_ID, EngineCall, EngineOptions, HOST_ID, MOCK_ANSWER, REJECTED_CANDIDATE, TestSession,
    answer_from_client, candidate, candidate_from, offer_from_host,
};

#[tokio::test]
async fn test_client_candidates_before_offer_are_applied_in_order() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (mut remote, engine) = session.client_awaiting_peer().await;

    remote.deliver(candidate_from("candidate:1", HOST_ID));
    remote.deliver(candidate_from("candidate:2", HOST_ID));
    remote.deliver(offer_from_host());

    assert_eq!(remote.next_message().await, SignalMessage::answer(MOCK_ANSWER));
    session
        .wait_for_state(ConnectionState::CandidateExchange)
        .await;

    assert_eq!(
        engine.added_candidates(),
        vec![
            candidate("candidate:1").encode(),
            candidate("candidate:2").encode()
        ]
    );

    // The offer was handed over before any queued candidate.
    let calls = engine.calls();
    assert!(matches!(calls[0], EngineCall::AcceptOffer(_)));

    engine.path_ready().await;
    session
        .wait_for_event(|e| *e == SessionEvent::Connected)
        .await;
    assert_eq!(engine.added_candidates().len(), 2, "applied exactly once");
}

#[tokio::test]
async fn test_host_candidates_before_answer_are_queued() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (remote, engine) = session.host_offer_sent().await;

    remote.deliver(candidate_from("candidate:early", CLIENT_ID));
    remote.deliver(answer_from_client());
    session
        .wait_for_state(ConnectionState::CandidateExchange)
        .await;

    let calls = engine.calls();
    let answer_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::ApplyAnswer(_)))
        .expect("answer applied");
    let candidate_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::AddCandidate(_)))
        .expect("candidate applied");
    assert!(answer_at < candidate_at);
}

#[tokio::test]
async fn test_candidates_during_answer_application_are_queued() {
    init_tracing();

    let mut session = TestSession::spawn();
    session.engines.set_options(EngineOptions {
        hold_negotiation: true,
        ..Default::default()
    });
    let (mut remote, engine) = session.host_awaiting_peer().await;

    remote.deliver(SignalMessage::ClientJoined {
        client_id: tether_core::ClientId::from(CLIENT_ID),
    });
    engine.wait_for_call(EngineCall::CreateOffer).await;
    engine.release();
    remote.next_message().await;

    remote.deliver(answer_from_client());
    engine
        .wait_for_call(EngineCall::ApplyAnswer(MOCK_ANSWER.to_owned()))
        .await;

    // The answer is still being applied.
    remote.deliver(candidate_from("candidate:mid", CLIENT_ID));
    remote.deliver(SignalMessage::error("nudge"));
    session.wait_for_diagnostic().await;
    assert!(engine.added_candidates().is_empty());

    engine.release();
    session
        .wait_for_state(ConnectionState::CandidateExchange)
        .await;
    assert_eq!(
        engine.added_candidates(),
        vec![candidate("candidate:mid").encode()]
    );
}

#[tokio::test]
async fn test_rejected_candidate_does_not_stop_the_drain() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (mut remote, engine) = session.client_awaiting_peer().await;

    remote.deliver(candidate_from("candidate:a", HOST_ID));
    remote.deliver(candidate_from(REJECTED_CANDIDATE, HOST_ID));
    remote.deliver(candidate_from("candidate:b", HOST_ID));
    remote.deliver(offer_from_host());

    remote.next_message().await;
    session
        .wait_for_state(ConnectionState::CandidateExchange)
        .await;

    assert_eq!(
        engine.added_candidates(),
        vec![
            candidate("candidate:a").encode(),
            candidate(REJECTED_CANDIDATE).encode(),
            candidate("candidate:b").encode()
        ]
    );
    assert_eq!(session.handle.state(), ConnectionState::CandidateExchange);
}
