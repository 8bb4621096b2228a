//! The client facade: connection lifecycle, calls, events, and the
//! incoming message queue.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use talkwire_core::records::{Talk, parse_list};
use talkwire_core::{API_VERSION, Frame, IncomingMessage, Value, events, methods};

use crate::dispatcher::{Dispatcher, EventHandler};
use crate::errors::ClientError;
use crate::options::Options;
use crate::transport::{Transport, WsSource, connect};

/// Default window a call waits for its response.
pub(crate) const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between protocol-level pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(45);

/// Capacity of the parsed-message queue. When full, new messages are shed
/// rather than stalling protocol processing.
const MESSAGE_QUEUE_CAPACITY: usize = 100;

/// A talkwire RPC client.
///
/// One client owns at most one WebSocket connection for its whole life:
/// [`Client::connect`] fails if called twice, and a closed client stays
/// closed (build a new one to reconnect). The client is cheap to clone and
/// fully thread-safe; clones share the connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    options: Options,
    dispatcher: Dispatcher,
    /// Write half of the live connection; `None` before `connect`.
    transport: RwLock<Option<Arc<Transport>>>,
    /// Set once `connect` has been attempted; enforces one connection per
    /// client instance.
    connect_started: AtomicBool,
    /// Set once the session is established (token accepted).
    session_up: AtomicBool,
    /// Cancels the read and heartbeat loops on close.
    shutdown: CancellationToken,
    /// talk id → organization id, built during bootstrap and refreshed by
    /// `get_talks`; fills in `domain_id` on incoming messages.
    talk_domains: RwLock<HashMap<String, String>>,
    message_tx: mpsc::Sender<IncomingMessage>,
    message_rx: Mutex<Option<mpsc::Receiver<IncomingMessage>>>,
}

impl Client {
    /// Build an unconnected client. Register event handlers, then call
    /// [`Client::connect`].
    #[must_use]
    pub fn new(options: Options) -> Self {
        let (message_tx, message_rx) = mpsc::channel(MESSAGE_QUEUE_CAPACITY);
        Self {
            inner: Arc::new(ClientInner {
                options,
                dispatcher: Dispatcher::new(),
                transport: RwLock::new(None),
                connect_started: AtomicBool::new(false),
                session_up: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
                talk_domains: RwLock::new(HashMap::new()),
                message_tx,
                message_rx: Mutex::new(Some(message_rx)),
            }),
        }
    }

    /// Establish the WebSocket connection and start the read and heartbeat
    /// loops. With an access token configured, also kicks off the session
    /// bootstrap sequence (session → initial data → notifications) in the
    /// background; listen for [`events::SESSION_CREATED`] and
    /// [`events::DATA_RECOVERED`] to track its progress.
    ///
    /// Fails if this client has already connected once, if the proxy
    /// configuration is malformed, or if the handshake does not complete
    /// within its 10-second deadline.
    pub async fn connect(&self) -> Result<(), ClientError> {
        if self.inner.connect_started.swap(true, Ordering::AcqRel) {
            return Err(ClientError::Connect {
                context: "already connected".to_owned(),
            });
        }

        tracing::debug!(
            name = %self.inner.options.name,
            host = self.inner.options.host().as_deref().unwrap_or("?"),
            "connecting"
        );
        let ws = match connect(&self.inner.options).await {
            Ok(ws) => ws,
            Err(e) => {
                // Only a successful handshake burns the instance; a failed
                // dial may be retried.
                self.inner.connect_started.store(false, Ordering::Release);
                return Err(e);
            }
        };
        let (sink, source) = ws.split();
        let transport = Arc::new(Transport::new(sink));
        *self.inner.transport.write() = Some(Arc::clone(&transport));

        let inner = Arc::clone(&self.inner);
        let read_transport = Arc::clone(&transport);
        drop(tokio::spawn(async move {
            inner.read_loop(source, read_transport).await;
        }));

        let inner = Arc::clone(&self.inner);
        let ping_transport = Arc::clone(&transport);
        drop(tokio::spawn(async move {
            inner.heartbeat_loop(ping_transport).await;
        }));

        self.inner.emit(events::CONNECTED, &Value::Nil);

        if self.inner.options.access_token.is_some() {
            let inner = Arc::clone(&self.inner);
            drop(tokio::spawn(async move {
                inner.bootstrap().await;
            }));
        }

        Ok(())
    }

    /// Whether the session has been established (token accepted by the
    /// server). Connection liveness is a separate concern; see
    /// [`events::ERROR`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.session_up.load(Ordering::Acquire)
    }

    /// Invoke an RPC method and wait for its response with the default
    /// 30-second timeout.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        self.inner
            .call_with_timeout(method, params, DEFAULT_CALL_TIMEOUT)
            .await
    }

    /// Invoke an RPC method with a caller-chosen timeout.
    ///
    /// The timeout is the only cancellation there is: the protocol has no
    /// cancel message, so a timed-out call just stops waiting locally and a
    /// late response is discarded.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        self.inner.call_with_timeout(method, params, timeout).await
    }

    /// Register an async handler for an event name: a lifecycle event or a
    /// server notification method. Handlers accumulate (no dedup, no
    /// unregister) and run as independent tasks; a panicking handler is
    /// logged and contained.
    pub fn on<F, Fut>(&self, event: &str, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |value| handler(value).boxed());
        self.inner.dispatcher.subscribe(event, handler);
    }

    /// Take the receiving end of the bounded incoming-message queue.
    ///
    /// Message notifications are parsed into [`IncomingMessage`] and pushed
    /// here in arrival order, in addition to the generic
    /// [`events::NOTIFY_CREATE_MESSAGE`] event. Returns `None` after the
    /// first take.
    #[must_use]
    pub fn take_messages(&self) -> Option<mpsc::Receiver<IncomingMessage>> {
        self.inner.message_rx.lock().take()
    }

    /// Convenience wrapper around [`Client::take_messages`]: spawn a task
    /// that feeds each incoming message to `handler`.
    pub fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(IncomingMessage) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(mut rx) = self.take_messages() else {
            tracing::warn!("message queue receiver already taken");
            return;
        };
        drop(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                handler(message).await;
            }
        }));
    }

    /// Close the connection and stop the background loops. Idempotent and
    /// safe from any task; in-flight calls fail via their timeouts or a
    /// fast [`ClientError::NotConnected`].
    pub async fn close(&self) {
        self.inner.shutdown.cancel();
        let transport = self.inner.transport.read().clone();
        if let Some(transport) = transport {
            transport.close().await;
        }
    }

    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }
}

impl ClientInner {
    pub(crate) async fn call_with_timeout(
        &self,
        method: &str,
        params: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let transport = self
            .transport
            .read()
            .clone()
            .ok_or(ClientError::NotConnected)?;

        let id = self.dispatcher.next_id();
        let rx = self.dispatcher.register(id, method);
        tracing::debug!(id, method, "issuing call");

        let frame = Frame::request(id, method, params);
        if let Err(e) = transport.send_frame(&frame).await {
            self.dispatcher.evict(id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(error))) => Err(ClientError::Remote(error)),
            // The sender is dropped only when the pending entry was evicted
            // out from under us (connection teardown).
            Ok(Err(_)) => Err(ClientError::NotConnected),
            Err(_) => {
                self.dispatcher.evict(id);
                tracing::debug!(id, method, "call timed out");
                Err(ClientError::Timeout {
                    method: method.to_owned(),
                    timeout,
                })
            }
        }
    }

    pub(crate) fn emit(&self, event: &str, payload: &Value) {
        self.dispatcher.emit(event, payload);
    }

    pub(crate) fn cache_talk_domains(&self, talks: &[Talk]) {
        let mut cache = self.talk_domains.write();
        for talk in talks {
            if !talk.domain_id.is_empty() {
                let _ = cache.insert(talk.id.clone(), talk.domain_id.clone());
            }
        }
    }

    // ─── Read loop ───────────────────────────────────────────────────────

    /// Drain the socket until close or failure. Runs as its own task; every
    /// inbound frame is routed here, in arrival order.
    async fn read_loop(self: Arc<Self>, mut source: WsSource, transport: Arc<Transport>) {
        loop {
            let next = tokio::select! {
                () = self.shutdown.cancelled() => break,
                next = source.next() => next,
            };

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    if !transport.is_closed() {
                        tracing::debug!(error = %e, "read failed");
                        transport.mark_closed();
                        self.emit(events::ERROR, &Value::from(e.to_string()));
                    }
                    break;
                }
                None => {
                    if !transport.is_closed() {
                        transport.mark_closed();
                        self.emit(events::ERROR, &Value::from("connection closed by server"));
                    }
                    break;
                }
            };

            match message {
                Message::Binary(data) => self.handle_frame(&data, &transport).await,
                Message::Pong(payload) => {
                    tracing::trace!(payload_len = payload.len(), "pong");
                }
                Message::Close(_) => {
                    if !transport.is_closed() {
                        transport.mark_closed();
                        self.emit(events::ERROR, &Value::from("connection closed by server"));
                    }
                    break;
                }
                // Pings are answered by the protocol layer on the next read.
                Message::Ping(_) | Message::Text(_) | Message::Frame(_) => {}
            }
        }
        tracing::debug!("read loop finished");
    }

    async fn handle_frame(&self, data: &[u8], transport: &Transport) {
        match Frame::decode(data) {
            Ok(frame) => {
                let routed = self.dispatcher.route(frame);
                if let Some(message) = routed.message {
                    self.enqueue_message(message);
                }
                if let Some(ack) = routed.ack {
                    if let Err(e) = transport.send_frame(&ack).await {
                        tracing::warn!(error = %e, "failed to acknowledge notification");
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, len = data.len(), "undecodable message");
                self.emit(events::DECODE_ERROR, &Value::from(e.to_string()));
            }
        }
    }

    /// Enrich and queue a parsed message. Shedding policy: when the queue
    /// is full the newest message is dropped so the read loop never stalls.
    fn enqueue_message(&self, mut message: IncomingMessage) {
        if message.domain_id.is_none() && !message.talk_id.is_empty() {
            message.domain_id = self.talk_domains.read().get(&message.talk_id).cloned();
        }
        match self.message_tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(id = %dropped.id, "message queue full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    // ─── Heartbeat loop ──────────────────────────────────────────────────

    /// Ping on a fixed interval until the connection dies. A failed ping
    /// write is sufficient evidence of a dead socket, so the connection is
    /// marked closed right there.
    async fn heartbeat_loop(self: Arc<Self>, transport: Arc<Transport>) {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        let _ = interval.tick().await;

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            if transport.is_closed() {
                break;
            }
            tracing::trace!("ping");
            if let Err(e) = transport.ping().await {
                tracing::debug!(error = %e, "ping failed");
                transport.mark_closed();
                break;
            }
        }
        tracing::debug!("heartbeat loop finished");
    }

    // ─── Session bootstrap ───────────────────────────────────────────────

    /// Authenticate and run the initialization sequence. The server
    /// requires this exact order before it will push notifications.
    async fn bootstrap(self: Arc<Self>) {
        let Some(token) = self.options.access_token.clone() else {
            return;
        };

        let params = vec![
            Value::from(token.as_str()),
            Value::from(API_VERSION),
            Value::from(std::env::consts::OS),
        ];
        match self
            .call_with_timeout(methods::CREATE_SESSION, params, DEFAULT_CALL_TIMEOUT)
            .await
        {
            Ok(result) => {
                tracing::debug!("session created");
                self.session_up.store(true, Ordering::Release);
                self.emit(events::SESSION_CREATED, &result);
            }
            Err(ClientError::Remote(error)) => {
                tracing::debug!(error = %error, "session rejected");
                self.emit(events::SESSION_ERROR, &error);
                return;
            }
            Err(e) => {
                self.emit(events::SESSION_ERROR, &Value::from(e.to_string()));
                return;
            }
        }

        if let Err(e) = self.synchronize().await {
            tracing::debug!(error = %e, "initialization failed");
            self.emit(events::NOTIFICATION_ERROR, &Value::from(e.to_string()));
        }
    }

    /// Fetch initial data, then ask the server to start pushing
    /// notifications, with the reset-and-retry dance the server sometimes
    /// demands.
    async fn synchronize(&self) -> Result<(), ClientError> {
        let domains = self.bootstrap_call(methods::GET_DOMAINS).await?;
        tracing::debug!(
            count = domains.as_array().map_or(0, Vec::len),
            "domains fetched"
        );

        let talks = self.bootstrap_call(methods::GET_TALKS).await?;
        let parsed = parse_list(&talks, Talk::from_value);
        tracing::debug!(count = parsed.len(), "talks fetched");
        self.cache_talk_domains(&parsed);

        let _ = self.bootstrap_call(methods::GET_TALK_STATUSES).await?;

        let started = self.bootstrap_call(methods::START_NOTIFICATION).await?;
        if started.as_bool() == Some(false) {
            // The server refuses until its notification cursor is reset.
            tracing::debug!("start_notification refused, resetting");
            let _ = self.bootstrap_call(methods::RESET_NOTIFICATION).await?;
            let _ = self.bootstrap_call(methods::START_NOTIFICATION).await?;
            let result = self
                .bootstrap_call(methods::UPDATE_LAST_USED_AT)
                .await
                .unwrap_or(Value::Nil);
            self.emit(events::DATA_RECOVERED, &result);
        } else {
            self.emit(events::DATA_RECOVERED, &started);
        }
        Ok(())
    }

    async fn bootstrap_call(&self, method: &str) -> Result<Value, ClientError> {
        self.call_with_timeout(method, vec![], DEFAULT_CALL_TIMEOUT)
            .await
    }
}
