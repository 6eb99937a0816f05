use tether_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_server};

#[tokio::test]
async fn test_offer_and_answer_are_forwarded_with_sender() {
    init_tracing();
    let server = spawn_server().await;

    let (mut host, code) = TestClient::host(&server.url).await.unwrap();
    let (mut client, _) = TestClient::join(&server.url, &code).await.unwrap();
    host.recv().await.unwrap();

    host.send(&SignalMessage::offer("v=0 offer")).await.unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        SignalMessage::offer("v=0 offer").with_sender(host.id.clone())
    );

    client.send(&SignalMessage::answer("v=0 answer")).await.unwrap();
    assert_eq!(
        host.recv().await.unwrap(),
        SignalMessage::answer("v=0 answer").with_sender(client.id.clone())
    );
}

#[tokio::test]
async fn test_offer_before_peer_is_rejected() {
    init_tracing();
    let server = spawn_server().await;

    let (mut host, _code) = TestClient::host(&server.url).await.unwrap();
    host.send(&SignalMessage::offer("v=0 offer")).await.unwrap();
    assert_eq!(
        host.recv().await.unwrap(),
        SignalMessage::error("No peer in session")
    );
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    init_tracing();
    let server = spawn_server().await;

    let (mut host_a, code_a) = TestClient::host(&server.url).await.unwrap();
    let (mut client_a, _) = TestClient::join(&server.url, &code_a).await.unwrap();
    host_a.recv().await.unwrap();

    let (mut host_b, code_b) = TestClient::host(&server.url).await.unwrap();
    let (mut client_b, _) = TestClient::join(&server.url, &code_b).await.unwrap();
    host_b.recv().await.unwrap();

    host_a.send(&SignalMessage::offer("for-a")).await.unwrap();
    assert_eq!(
        client_a.recv().await.unwrap(),
        SignalMessage::offer("for-a").with_sender(host_a.id.clone())
    );
    assert!(client_b.is_silent_for(200).await);
    assert!(host_b.is_silent_for(50).await);
}
