//! Relay host: the trusted side that answers permission requests

use crate::error::{RelayError, RelayResult};
use crate::permission::PermissionAuthority;
use crate::protocol::{
    PermissionRequestReply, PermissionStatusReply, PermissionUpdate, RelayPush, RelayRequest,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

/// Outbound queues of connected clients, keyed by connection ID
type Connections = Arc<DashMap<String, mpsc::UnboundedSender<Message>>>;

/// WebSocket relay host
#[derive(Clone)]
pub struct RelayHost {
    /// Address the host binds to
    pub bind_addr: SocketAddr,
    authority: Arc<dyn PermissionAuthority>,
    connections: Connections,
}

impl RelayHost {
    /// Create a host answering from `authority`
    pub fn new(bind_addr: SocketAddr, authority: Arc<dyn PermissionAuthority>) -> Self {
        Self {
            bind_addr,
            authority,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// Bind and serve until the task is dropped
    pub async fn start(&self) -> RelayResult<()> {
        let listener =
            TcpListener::bind(self.bind_addr)
                .await
                .map_err(|e| RelayError::Bind {
                    address: self.bind_addr,
                    source: e,
                })?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> RelayResult<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Permission relay listening on {}", addr);
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!("New relay connection from {}", addr);
                    let host = self.clone();
                    tokio::spawn(async move {
                        host.handle_connection(stream).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept relay connection: {}", e);
                }
            }
        }
    }

    /// Number of connected clients
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Push a permission change to every connected client; returns how many
    /// clients it was queued for
    pub fn publish(&self, update: PermissionUpdate) -> usize {
        let text = match encode(&RelayPush::CameraPermissionUpdate(update)) {
            Some(text) => text,
            None => return 0,
        };

        let mut delivered = 0;
        for connection in self.connections.iter() {
            if connection.value().send(Message::Text(text.clone())).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!("Published permission update to {} clients", delivered);
        delivered
    }

    /// Handle incoming WebSocket connection
    async fn handle_connection(&self, stream: TcpStream) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let connection_id = Uuid::new_v4().to_string();
        tracing::debug!("Relay connection established: {}", connection_id);

        let (mut sink, mut source) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        self.connections.insert(connection_id.clone(), tx.clone());

        let writer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(reply) = self.handle_request(&text).await {
                        if tx.send(Message::Text(reply)).is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!("Relay connection {} closed", connection_id);
                    break;
                }
                Err(e) => {
                    tracing::error!("WebSocket error on relay connection {}: {}", connection_id, e);
                    break;
                }
                _ => {
                    // Ignore other message types (Binary, Ping, Pong)
                }
            }
        }

        // Cleanup on disconnect
        self.connections.remove(&connection_id);
        drop(tx);
        let _ = writer.await;
    }

    /// Answer one request; the reply text is `None` only if encoding failed
    async fn handle_request(&self, text: &str) -> Option<String> {
        match serde_json::from_str::<RelayRequest>(text) {
            Ok(RelayRequest::CheckCameraPermission) => {
                let granted = self.authority.query().await;
                tracing::debug!("Answering permission check: granted={}", granted);
                encode(&PermissionStatusReply { granted })
            }
            Ok(RelayRequest::RequestCameraPermission) => {
                let reply = self.authority.request().await;
                tracing::info!("Permission request answered: success={}", reply.success);
                encode(&reply)
            }
            Err(e) => {
                tracing::warn!("Invalid relay message: {}", e);
                encode(&PermissionRequestReply::failed(format!(
                    "invalid relay message: {e}"
                )))
            }
        }
    }
}

fn encode<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("Failed to encode relay message: {}", e);
            None
        }
    }
}
