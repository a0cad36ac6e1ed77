//! WebSocket relay client

use crate::error::{RelayError, RelayResult};
use crate::permission::PermissionRelay;
use crate::protocol::{
    PermissionRequestReply, PermissionStatusReply, PermissionUpdate, RelayPush, RelayRequest,
};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Slot for the reply to the single in-flight request
type PendingReply = Arc<Mutex<Option<oneshot::Sender<Value>>>>;

/// Relay client speaking JSON over a WebSocket to a [`RelayHost`](crate::RelayHost)
pub struct WsRelayClient {
    url: String,
    writer: tokio::sync::Mutex<SplitSink<WsStream, Message>>,
    pending: PendingReply,
    connected: Arc<AtomicBool>,
    updates: broadcast::Sender<PermissionUpdate>,
    reader: JoinHandle<()>,
}

impl WsRelayClient {
    /// Connect to a relay host, e.g. `ws://127.0.0.1:9300`
    pub async fn connect(url: &str) -> RelayResult<Self> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| RelayError::unavailable(format!("{url}: {e}")))?;
        info!(%url, "Connected to permission relay");

        let (writer, reader) = ws.split();
        let pending: PendingReply = Arc::new(Mutex::new(None));
        let connected = Arc::new(AtomicBool::new(true));
        let (updates, _) = broadcast::channel(16);

        let reader = tokio::spawn(read_loop(
            reader,
            pending.clone(),
            connected.clone(),
            updates.clone(),
        ));

        Ok(Self {
            url: url.to_string(),
            writer: tokio::sync::Mutex::new(writer),
            pending,
            connected,
            updates,
            reader,
        })
    }

    /// Relay URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the connection is still open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send one request and wait for its reply
    async fn round_trip<T: DeserializeOwned>(&self, request: RelayRequest) -> RelayResult<T> {
        // Holding the writer for the whole exchange keeps one request in flight
        let mut writer = self.writer.lock().await;

        let (tx, rx) = oneshot::channel();
        *self.pending.lock() = Some(tx);
        if !self.is_connected() {
            self.pending.lock().take();
            return Err(RelayError::unavailable("relay connection closed"));
        }

        let text = serde_json::to_string(&request).map_err(|e| RelayError::InvalidMessage {
            message: format!("{request:?}"),
            source: e,
        })?;
        debug!(%text, "Sending relay request");
        if let Err(e) = writer.send(Message::Text(text)).await {
            self.pending.lock().take();
            return Err(RelayError::Transport { source: e });
        }

        let reply = rx
            .await
            .map_err(|_| RelayError::unavailable("relay connection closed"))?;
        drop(writer);

        serde_json::from_value(reply.clone()).map_err(|e| RelayError::InvalidMessage {
            message: reply.to_string(),
            source: e,
        })
    }
}

async fn read_loop(
    mut reader: SplitStream<WsStream>,
    pending: PendingReply,
    connected: Arc<AtomicBool>,
    updates: broadcast::Sender<PermissionUpdate>,
) {
    while let Some(message) = reader.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch(&text, &pending, &updates),
            Ok(Message::Close(_)) => {
                debug!("Relay closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Relay connection error");
                break;
            }
            _ => {
                // Ignore other message types (Binary, Ping, Pong)
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    // Dropping the sender fails any request still waiting
    pending.lock().take();
}

fn dispatch(text: &str, pending: &PendingReply, updates: &broadcast::Sender<PermissionUpdate>) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed relay message");
            return;
        }
    };

    if value.get("action").is_some() {
        match serde_json::from_value::<RelayPush>(value) {
            Ok(RelayPush::CameraPermissionUpdate(update)) => {
                debug!(granted = update.granted, "Relay pushed permission update");
                let _ = updates.send(update);
            }
            Err(e) => warn!(error = %e, "Ignoring unknown relay push"),
        }
        return;
    }

    match pending.lock().take() {
        Some(reply) => {
            let _ = reply.send(value);
        }
        None => debug!("Dropping relay reply with no request in flight"),
    }
}

#[async_trait]
impl PermissionRelay for WsRelayClient {
    async fn check_permission(&self) -> RelayResult<bool> {
        let reply: PermissionStatusReply =
            self.round_trip(RelayRequest::CheckCameraPermission).await?;
        Ok(reply.granted)
    }

    async fn request_permission(&self) -> RelayResult<bool> {
        let reply: PermissionRequestReply =
            self.round_trip(RelayRequest::RequestCameraPermission).await?;
        if let Some(error) = &reply.error {
            info!(%error, "Relay reported permission prompt failure");
        }
        Ok(reply.success)
    }

    fn subscribe(&self) -> broadcast::Receiver<PermissionUpdate> {
        self.updates.subscribe()
    }
}

impl Drop for WsRelayClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
