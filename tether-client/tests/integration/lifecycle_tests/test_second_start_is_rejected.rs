use tether_client::{ConnectionState, StartError};
use tether_core::{ClientId, SessionCode};

use crate::integration::init_tracing;
use crate::utils::{CLIENT_ID, CODE, HOST_ID, OpenBehavior, TestSession};

#[tokio::test]
async fn test_start_while_live_is_rejected() {
    init_tracing();

    let mut session = TestSession::spawn();
    let (mut remote, _engine) = session.host_awaiting_peer().await;

    let result = session
        .handle
        .start_as_client(SessionCode::from(CODE), ClientId::from(CLIENT_ID))
        .await;
    assert!(
        matches!(result, Err(StartError::InvalidState(ConnectionState::AwaitingPeer))),
        "{:?}",
        result
    );

    assert_eq!(session.handle.state(), ConnectionState::AwaitingPeer);
    assert_eq!(session.relay.open_count(), 1);
    assert!(remote.drain().is_empty());
}

#[tokio::test]
async fn test_start_while_pending_is_rejected() {
    init_tracing();

    let session = TestSession::spawn();
    session.relay.set_behavior(OpenBehavior::Hang);

    let handle = session.handle.clone();
    let first = tokio::spawn(async move { handle.start_as_host(ClientId::from(HOST_ID)).await });

    // Wait for the first attempt to reach the relay.
    while session.relay.open_count() == 0 {
        tokio::task::yield_now().await;
    }

    let second = session.handle.start_as_host(ClientId::from(HOST_ID)).await;
    assert!(matches!(second, Err(StartError::AlreadyStarting)), "{:?}", second);

    session.handle.disconnect().await;
    let first = first.await.unwrap();
    assert!(matches!(first, Err(StartError::Cancelled)), "{:?}", first);
}
