//! Integration tests for the WebSocket relay
//!
//! A real [`RelayHost`] is bound to a loopback port and a
//! [`WsRelayClient`] talks to it over the wire.

use deepcheck_relay::{
    PermissionRelay, PermissionStore, PermissionUpdate, RelayError, RelayHost, WsRelayClient,
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_test::assert_ok;

async fn start_test_host(store: Arc<PermissionStore>) -> (RelayHost, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let host = RelayHost::new(addr, store);

    let server = host.clone();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    (host, addr)
}

#[tokio::test]
async fn test_check_then_request_permission() {
    let store = Arc::new(PermissionStore::new(true));
    let (_host, addr) = start_test_host(store.clone()).await;

    let client = assert_ok!(WsRelayClient::connect(&format!("ws://{addr}")).await);
    assert!(client.is_connected());

    assert!(!assert_ok!(client.check_permission().await));
    assert!(assert_ok!(client.request_permission().await));
    assert!(assert_ok!(client.check_permission().await));
    assert_eq!(store.decision(), Some(true));
}

#[tokio::test]
async fn test_denied_request() {
    let (_host, addr) = start_test_host(Arc::new(PermissionStore::denied())).await;
    let client = WsRelayClient::connect(&format!("ws://{addr}")).await.unwrap();

    assert!(!client.check_permission().await.unwrap());
    assert!(!client.request_permission().await.unwrap());
}

#[tokio::test]
async fn test_published_update_reaches_client() {
    let (host, addr) = start_test_host(Arc::new(PermissionStore::new(false))).await;
    let client = WsRelayClient::connect(&format!("ws://{addr}")).await.unwrap();
    let mut updates = client.subscribe();

    // A completed round trip guarantees the host registered the connection
    client.check_permission().await.unwrap();
    assert_eq!(host.connection_count(), 1);

    assert_eq!(host.publish(PermissionUpdate::granted()), 1);
    let update = timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("push not delivered")
        .unwrap();
    assert_eq!(update, PermissionUpdate::granted());

    // Requests still work after a push
    assert!(!client.check_permission().await.unwrap());
}

#[tokio::test]
async fn test_connect_failure_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    match WsRelayClient::connect(&format!("ws://{addr}")).await {
        Err(error) => assert!(error.is_unavailable()),
        Ok(_) => panic!("Expected connection failure"),
    }
}

#[tokio::test]
async fn test_host_hanging_up_mid_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accepts the handshake, reads one request and hangs up without replying
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.next().await;
        drop(ws);
    });

    let client = WsRelayClient::connect(&format!("ws://{addr}")).await.unwrap();
    let result = timeout(Duration::from_secs(5), client.request_permission())
        .await
        .expect("request hung after host hung up");

    assert!(matches!(result, Err(RelayError::Unavailable { .. })));
    assert!(!client.is_connected());
}
