use bytes::Bytes;
use tether_client::{ConnectionState, SessionCoordinator, SessionEvent};
use tether_core::{ClientId, Role};

use crate::integration::init_tracing;
use crate::utils::{local_config, spawn_relay, wait_live, wait_live_all};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_peers_over_live_relay() {
    init_tracing();
    let url = spawn_relay().await;

    let (host, mut host_events) = SessionCoordinator::spawn_webrtc(local_config(&url));
    let (client, mut client_events) = SessionCoordinator::spawn_webrtc(local_config(&url));

    host.start_as_host(ClientId::from("host")).await.unwrap();
    let code = match wait_live(&mut host_events, |e| matches!(e, SessionEvent::SessionReady { .. })).await {
        SessionEvent::SessionReady { code, role } => {
            assert_eq!(role, Role::Host);
            code
        }
        other => panic!("Expected session-ready, got {:?}", other),
    };

    client
        .start_as_client(code.clone(), ClientId::from("client"))
        .await
        .unwrap();

    wait_live(&mut host_events, |e| matches!(e, SessionEvent::PeerJoined(_))).await;
    wait_live(&mut client_events, |e| matches!(e, SessionEvent::PeerJoined(_))).await;

    let ready = [SessionEvent::Connected, SessionEvent::ChannelOpen];
    wait_live_all(&mut host_events, &ready).await;
    wait_live_all(&mut client_events, &ready).await;
    assert_eq!(host.state(), ConnectionState::Connected);
    assert_eq!(client.state(), ConnectionState::Connected);

    host.send_data(Bytes::from_static(b"ping")).await;
    assert_eq!(
        wait_live(&mut client_events, |e| matches!(e, SessionEvent::DataReceived(_))).await,
        SessionEvent::DataReceived(Bytes::from_static(b"ping"))
    );

    client.send_data(Bytes::from_static(b"pong")).await;
    assert_eq!(
        wait_live(&mut host_events, |e| matches!(e, SessionEvent::DataReceived(_))).await,
        SessionEvent::DataReceived(Bytes::from_static(b"pong"))
    );

    host.disconnect().await;
    assert_eq!(host.state(), ConnectionState::Disconnected);
    wait_live(&mut client_events, |e| *e == SessionEvent::Disconnected).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
