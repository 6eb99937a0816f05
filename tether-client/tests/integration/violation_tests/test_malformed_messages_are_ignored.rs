use tether_client::ConnectionState;
use tether_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{CLIENT_ID, TestSession, drain_events};

#[tokio::test]
async fn test_malformed_messages_are_ignored() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (remote, engine) = session.host_offer_sent().await;

    let malformed = [
        "not json",
        r#"{"type":"take-control"}"#,
        r#"{"type":"client-joined"}"#,
        r#"{"type":"webrtc-answer","from":"client-1"}"#,
        r#"{"sdp":"v=0"}"#,
    ];
    for text in malformed {
        remote.deliver_raw(text);
        let diagnostic = session.wait_for_diagnostic().await;
        assert!(diagnostic.contains("Malformed"), "{}", diagnostic);
    }

    assert_eq!(session.handle.state(), ConnectionState::DescriptorExchange);
    assert_eq!(engine.calls().len(), 1);
    assert!(drain_events(&mut session.events).is_empty());
}

#[tokio::test]
async fn test_bad_candidate_encoding_is_ignored() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (remote, engine) = session.connected_host().await;
    let before = engine.calls().len();

    for encoded in ["no-separators", "candidate:x|zero|0", "candidate:x|-1|0"] {
        remote.deliver(SignalMessage::IceCandidate {
            candidate: encoded.to_owned(),
            from: Some(CLIENT_ID.into()),
        });
        let diagnostic = session.wait_for_diagnostic().await;
        assert!(diagnostic.contains("Malformed candidate"), "{}", diagnostic);
    }

    assert_eq!(engine.calls().len(), before);
    assert_eq!(session.handle.state(), ConnectionState::Connected);
}
