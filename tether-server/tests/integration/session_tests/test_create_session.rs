use tether_core::{Role, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_server};

#[tokio::test]
async fn test_create_session() {
    init_tracing();
    let server = spawn_server().await;

    let mut host = TestClient::connect(&server.url).await.unwrap();
    assert!(!host.id.as_str().is_empty());

    host.send(&SignalMessage::CreateSession).await.unwrap();
    let reply = host.recv().await.unwrap();

    let SignalMessage::SessionCreated { session_code, role } = reply else {
        panic!("Expected session-created, got {:?}", reply);
    };
    assert_eq!(role, Some(Role::Host));
    assert_eq!(session_code.as_str().len(), 6);
    assert!(server.service.sessions().contains(&session_code));
}

#[tokio::test]
async fn test_codes_are_unique() {
    init_tracing();
    let server = spawn_server().await;

    let (_a, code_a) = TestClient::host(&server.url).await.unwrap();
    let (_b, code_b) = TestClient::host(&server.url).await.unwrap();
    assert_ne!(code_a, code_b);
    assert_eq!(server.service.sessions().len(), 2);
}

#[tokio::test]
async fn test_second_create_is_rejected() {
    init_tracing();
    let server = spawn_server().await;

    let (mut host, _code) = TestClient::host(&server.url).await.unwrap();
    host.send(&SignalMessage::CreateSession).await.unwrap();

    assert_eq!(
        host.recv().await.unwrap(),
        SignalMessage::error("Already in a session")
    );
    assert_eq!(server.service.sessions().len(), 1);
}
