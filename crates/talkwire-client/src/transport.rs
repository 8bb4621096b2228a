//! Socket ownership: handshake, serialized writes, liveness pings.
//!
//! One `Transport` wraps exactly one WebSocket connection and is never
//! re-entered: a closed transport stays closed and every later write fails
//! fast with [`ClientError::NotConnected`]. Reconnection means a new client.
//!
//! Writes from request issuance, notification acks, and the heartbeat all
//! race for the socket; a single async mutex around the write half
//! serializes them. There is no outbound batching or queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use talkwire_core::Frame;

use crate::errors::ClientError;
use crate::options::Options;
use crate::proxy;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Handshake deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Heartbeat ping payload, matching the reference client.
const PING_PAYLOAD: &[u8] = b"PING";

/// Perform the WebSocket handshake, optionally through an HTTP proxy.
pub(crate) async fn connect(options: &Options) -> Result<WsStream, ClientError> {
    let endpoint = Url::parse(&options.endpoint).map_err(|e| ClientError::Connect {
        context: format!("invalid endpoint {}: {e}", options.endpoint),
    })?;

    let handshake = async {
        match &options.proxy_url {
            Some(proxy_url) => proxy::connect_via_proxy(&endpoint, proxy_url).await,
            None => {
                let (ws, _response) =
                    connect_async(endpoint.as_str())
                        .await
                        .map_err(|e| ClientError::Connect {
                            context: format!("websocket dial failed: {e}"),
                        })?;
                Ok(ws)
            }
        }
    };

    tokio::time::timeout(CONNECT_TIMEOUT, handshake)
        .await
        .map_err(|_| ClientError::Connect {
            context: format!("handshake timed out after {CONNECT_TIMEOUT:?}"),
        })?
}

/// The write half of the connection plus the closed flag.
pub(crate) struct Transport {
    sink: AsyncMutex<WsSink>,
    closed: AtomicBool,
}

impl Transport {
    pub(crate) fn new(sink: WsSink) -> Self {
        Self {
            sink: AsyncMutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Flip the closed flag without touching the socket. Used by the read
    /// loop and heartbeat when they discover the connection is dead.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Encode and write one frame as a single binary message.
    pub(crate) async fn send_frame(&self, frame: &Frame) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::NotConnected);
        }
        let data = frame.encode();
        let mut sink = self.sink.lock().await;
        sink.send(Message::Binary(data.into()))
            .await
            .map_err(|e| ClientError::Write {
                context: e.to_string(),
            })
    }

    /// Write a protocol-level ping control frame.
    pub(crate) async fn ping(&self) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::NotConnected);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Ping(PING_PAYLOAD.to_vec().into()))
            .await
            .map_err(|e| ClientError::Write {
                context: e.to_string(),
            })
    }

    /// Close the connection. Idempotent; safe from any task.
    pub(crate) async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sink = self.sink.lock().await;
        // Best effort: the peer may already be gone.
        let _ = sink.send(Message::Close(None)).await;
    }
}
