//! CDP Client - The Core Communication Layer
//!
//! Design decisions:
//! 1. Single WebSocket per browser connection (no per-session WS overhead)
//! 2. Request/response matching via ID; events are only logged
//! 3. Every request is bounded by a timeout
//! 4. Fail fast - no retries, no queuing. Let the caller decide.

use dashmap::DashMap;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::protocol::*;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum CDPError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CDP protocol error: {code} - {message}")]
    Protocol { code: i32, message: String },

    #[error("Request {method} timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    #[error("Connection closed")]
    Closed,

    #[error("Invalid response for {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

/// Result type for CDP operations
pub type Result<T> = std::result::Result<T, CDPError>;

/// CDP Client - manages single WebSocket connection to browser
pub struct CDPClient {
    /// Monotonic request ID counter
    next_id: AtomicU64,

    /// Pending requests waiting for responses
    /// Key: request_id, Value: oneshot sender for response
    pending: Arc<DashMap<RequestId, oneshot::Sender<CDPResponse>>>,

    /// WebSocket write half
    ws_sink: Mutex<WsSink>,

    /// Set once the receiver loop has stopped
    closed: Arc<AtomicBool>,

    request_timeout: Duration,
}

impl CDPClient {
    /// Connect to Chrome DevTools Protocol endpoint
    pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
        Self::connect_with_timeout(ws_url, DEFAULT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(ws_url: &str, request_timeout: Duration) -> Result<Arc<Self>> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (sink, mut stream) = ws_stream.split();

        let pending: Arc<DashMap<RequestId, oneshot::Sender<CDPResponse>>> = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let client = Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::clone(&pending),
            ws_sink: Mutex::new(sink),
            closed: Arc::clone(&closed),
            request_timeout,
        });

        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = Self::handle_message(&pending, &text) {
                            tracing::error!("[CDPClient] Failed to handle message: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::error!("[CDPClient] WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            tracing::info!("[CDPClient] WebSocket closed");
            closed.store(true, Ordering::Release);
            // Dropping the senders wakes every waiter with `Closed`
            pending.clear();
        });

        Ok(client)
    }

    /// Send CDP request and wait for response
    pub async fn send_request(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CDPError::Closed);
        }

        let method = method.into();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CDPRequest {
            id,
            method: method.clone(),
            params,
            session_id,
        };

        let json = serde_json::to_string(&request)?;
        let rx = Self::register_pending(&self.pending, &self.closed, id)?;

        let sent = self.ws_sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.pending.remove(&id);
            return Err(CDPError::WebSocket(e));
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(CDPError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                tracing::warn!("[CDPClient] {} timed out", method);
                return Err(CDPError::Timeout {
                    method,
                    timeout: self.request_timeout,
                });
            }
        };

        if let Some(error) = response.error {
            return Err(CDPError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Reserve a response slot for request `id`
    fn register_pending(
        pending: &DashMap<RequestId, oneshot::Sender<CDPResponse>>,
        closed: &AtomicBool,
        id: RequestId,
    ) -> Result<oneshot::Receiver<CDPResponse>> {
        let (tx, rx) = oneshot::channel();
        pending.insert(id, tx);

        // The receiver loop may have stopped and cleared `pending` before the insert
        if closed.load(Ordering::Acquire) {
            pending.remove(&id);
            return Err(CDPError::Closed);
        }
        Ok(rx)
    }

    /// Route one incoming WebSocket message
    fn handle_message(
        pending: &DashMap<RequestId, oneshot::Sender<CDPResponse>>,
        text: &str,
    ) -> Result<()> {
        let msg: CDPMessage = serde_json::from_str(text)?;

        match msg {
            CDPMessage::Response(response) => {
                if let Some((_, tx)) = pending.remove(&response.id) {
                    let _ = tx.send(response); // Receiver dropped after a timeout
                } else {
                    tracing::warn!("[CDPClient] Response for unknown request: {}", response.id);
                }
            }
            CDPMessage::Event(event) => {
                tracing::trace!(method = %event.method, "[CDPClient] event");
            }
        }

        Ok(())
    }

    /// Close connection gracefully
    pub async fn close(&self) -> Result<()> {
        self.ws_sink.lock().await.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_resolves_pending_request() {
        let pending = DashMap::new();
        let (tx, mut rx) = oneshot::channel();
        pending.insert(3, tx);

        CDPClient::handle_message(&pending, r#"{"id":3,"result":{"nodeId":1}}"#).unwrap();

        let response = rx.try_recv().unwrap();
        assert_eq!(response.result.unwrap()["nodeId"], 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_register_after_close_fails_fast() {
        let pending = DashMap::new();
        let closed = AtomicBool::new(true);

        let result = CDPClient::register_pending(&pending, &closed, 7);

        assert!(matches!(result, Err(CDPError::Closed)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_register_while_open_keeps_slot() {
        let pending = DashMap::new();
        let closed = AtomicBool::new(false);

        let mut rx = CDPClient::register_pending(&pending, &closed, 7).unwrap();
        assert!(pending.contains_key(&7));

        CDPClient::handle_message(&pending, r#"{"id":7,"result":{}}"#).unwrap();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_events_and_unknown_ids_are_ignored() {
        let pending = DashMap::new();
        CDPClient::handle_message(&pending, r#"{"method":"DOM.documentUpdated","params":{}}"#).unwrap();
        CDPClient::handle_message(&pending, r#"{"id":99,"result":{}}"#).unwrap();
        assert!(CDPClient::handle_message(&pending, "not json").is_err());
    }

    #[tokio::test]
    #[ignore] // Needs running Chrome
    async fn test_connect() {
        let client = CDPClient::connect("ws://localhost:9222/devtools/browser")
            .await
            .unwrap();

        let result = client
            .send_request("Browser.getVersion", None, None)
            .await
            .unwrap();

        println!("Browser version: {:?}", result);
    }
}
