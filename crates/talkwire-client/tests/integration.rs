//! End-to-end protocol tests against an in-process mock server.
//!
//! The mock accepts one WebSocket connection, decodes MessagePack RPC
//! frames, answers requests from a scripted handler table, records
//! everything the client sends (including notification acks), and can push
//! server-initiated frames and raw bytes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rmpv::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use talkwire_client::{Client, ClientError, Options, events};
use talkwire_core::Frame;

const WAIT: Duration = Duration::from_secs(2);

// ─── Mock server ─────────────────────────────────────────────────────────────

type Handler = Box<dyn Fn(&[Value]) -> Result<Value, Value> + Send + Sync>;
type ServerSink = SplitSink<WebSocketStream<TcpStream>, Message>;

struct ServerState {
    handlers: Mutex<HashMap<String, Handler>>,
    /// Methods that get no response at all (for timeout tests).
    silent: Mutex<HashSet<String>>,
    /// Request frames received from the client.
    received: Mutex<Vec<Frame>>,
    /// Response frames received from the client (notification acks).
    acks: Mutex<Vec<Frame>>,
    sink: tokio::sync::Mutex<Option<ServerSink>>,
    /// When set to N, buffer N responses and send them in reverse order.
    reverse_batch: Mutex<Option<usize>>,
}

struct MockServer {
    url: String,
    state: Arc<ServerState>,
}

impl MockServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState {
            handlers: Mutex::new(HashMap::new()),
            silent: Mutex::new(HashSet::new()),
            received: Mutex::new(Vec::new()),
            acks: Mutex::new(Vec::new()),
            sink: tokio::sync::Mutex::new(None),
            reverse_batch: Mutex::new(None),
        });

        let server_state = Arc::clone(&state);
        let _server = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let ws = accept_async(stream).await.unwrap();
            let (sink, mut source) = ws.split();
            *server_state.sink.lock().await = Some(sink);

            let mut reversed: Vec<Frame> = Vec::new();
            while let Some(Ok(message)) = source.next().await {
                let Message::Binary(data) = message else {
                    continue;
                };
                let Ok(frame) = Frame::decode(&data) else {
                    continue;
                };
                match frame {
                    Frame::Request {
                        id,
                        ref method,
                        ref params,
                    } => {
                        server_state.received.lock().push(frame.clone());
                        if server_state.silent.lock().contains(method.as_str()) {
                            continue;
                        }
                        let reply = {
                            let handlers = server_state.handlers.lock();
                            match handlers.get(method.as_str()) {
                                Some(handler) => match handler(params) {
                                    Ok(result) => Frame::Response {
                                        id,
                                        error: Value::Nil,
                                        result,
                                    },
                                    Err(error) => Frame::Response {
                                        id,
                                        error,
                                        result: Value::Nil,
                                    },
                                },
                                None => Frame::Response {
                                    id,
                                    error: Value::from(format!("no handler for {method}")),
                                    result: Value::Nil,
                                },
                            }
                        };
                        let batch_size = *server_state.reverse_batch.lock();
                        if let Some(n) = batch_size {
                            reversed.push(reply);
                            if reversed.len() == n {
                                *server_state.reverse_batch.lock() = None;
                                for frame in reversed.drain(..).rev() {
                                    send_frame(&server_state, &frame).await;
                                }
                            }
                        } else {
                            send_frame(&server_state, &reply).await;
                        }
                    }
                    Frame::Response { .. } => {
                        server_state.acks.lock().push(frame);
                    }
                }
            }
        });

        Self {
            url: format!("ws://{addr}"),
            state,
        }
    }

    fn on<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        let _ = self
            .state
            .handlers
            .lock()
            .insert(method.to_owned(), Box::new(handler));
    }

    fn on_result(&self, method: &str, result: Value) {
        self.on(method, move |_| Ok(result.clone()));
    }

    fn on_error(&self, method: &str, error: Value) {
        self.on(method, move |_| Err(error.clone()));
    }

    fn silence(&self, method: &str) {
        let _ = self.state.silent.lock().insert(method.to_owned());
    }

    fn respond_in_reverse(&self, batch: usize) {
        *self.state.reverse_batch.lock() = Some(batch);
    }

    async fn push(&self, frame: Frame) {
        self.wait_for_sink().await;
        send_frame(&self.state, &frame).await;
    }

    /// Push a server-initiated notification: `[0, id, method, [payload]]`.
    async fn notify(&self, id: u64, method: &str, payload: Value) {
        self.push(Frame::request(id, method, vec![payload])).await;
    }

    async fn push_raw(&self, data: Vec<u8>) {
        self.wait_for_sink().await;
        let mut sink = self.state.sink.lock().await;
        sink.as_mut()
            .unwrap()
            .send(Message::Binary(data.into()))
            .await
            .unwrap();
    }

    async fn wait_for_sink(&self) {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            if self.state.sink.lock().await.is_some() {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "client never connected"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn received(&self) -> Vec<Frame> {
        self.state.received.lock().clone()
    }

    fn received_methods(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Request { method, .. } => Some(method),
                Frame::Response { .. } => None,
            })
            .collect()
    }

    async fn wait_for_acks(&self, count: usize) -> Vec<Frame> {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let acks = self.state.acks.lock().clone();
            if acks.len() >= count {
                return acks;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "only {} of {count} acks arrived",
                acks.len()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn wait_for_requests(&self, count: usize) -> Vec<Frame> {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let received = self.received();
            if received.len() >= count {
                return received;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "only {} of {count} requests arrived",
                received.len()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

async fn send_frame(state: &ServerState, frame: &Frame) {
    let mut sink = state.sink.lock().await;
    if let Some(sink) = sink.as_mut() {
        let _ = sink.send(Message::Binary(frame.encode().into())).await;
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn connected_client(server: &MockServer) -> Client {
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    client.connect().await.unwrap();
    client
}

fn event_channel(client: &Client, event: &str) -> mpsc::UnboundedReceiver<Value> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on(event, move |value| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(value);
        }
    });
    rx
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("event not delivered in time")
        .expect("event channel closed")
}

fn message_payload(id: &str, talk_id: &str, text: &str) -> Value {
    Value::Map(vec![
        (Value::from("id"), Value::from(id)),
        (Value::from("talk_id"), Value::from(talk_id)),
        (Value::from("user_id"), Value::from("u1")),
        (Value::from("content"), Value::from(text)),
        (Value::from("type"), Value::from(1u64)),
    ])
}

// ─── Calls ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn call_returns_result_unchanged() {
    let server = MockServer::start().await;
    server.on_result(
        "get_me",
        Value::Map(vec![(Value::from("id"), Value::from("user123"))]),
    );
    let client = connected_client(&server).await;

    let result = client.call("get_me", vec![]).await.unwrap();
    assert_eq!(
        talkwire_core::value::field(&result, "id").and_then(Value::as_str),
        Some("user123")
    );

    // First id allocated on the connection is 1.
    let received = server.received();
    assert_matches!(&received[0], Frame::Request { id: 1, method, params } => {
        assert_eq!(method, "get_me");
        assert!(params.is_empty());
    });
}

#[tokio::test]
async fn remote_error_passes_through_verbatim() {
    let server = MockServer::start().await;
    let error = Value::Map(vec![(Value::from("message"), Value::from("not found"))]);
    server.on_error("bad_method", error.clone());
    let client = connected_client(&server).await;

    let err = client.call("bad_method", vec![]).await.unwrap_err();
    assert_matches!(err, ClientError::Remote(payload) => {
        assert_eq!(payload, error);
    });
}

#[tokio::test]
async fn concurrent_calls_resolve_out_of_order() {
    let server = MockServer::start().await;
    // Echo the first parameter back.
    server.on("echo", |params| Ok(params.first().cloned().unwrap_or(Value::Nil)));
    server.respond_in_reverse(3);
    let client = connected_client(&server).await;

    let (a, b, c) = tokio::join!(
        client.call("echo", vec![Value::from("a")]),
        client.call("echo", vec![Value::from("b")]),
        client.call("echo", vec![Value::from("c")]),
    );
    assert_eq!(a.unwrap(), Value::from("a"));
    assert_eq!(b.unwrap(), Value::from("b"));
    assert_eq!(c.unwrap(), Value::from("c"));
}

#[tokio::test]
async fn timeout_evicts_call_and_late_response_is_discarded() {
    let server = MockServer::start().await;
    server.silence("slow");
    server.on_result("get_me", Value::from("me"));
    let client = connected_client(&server).await;

    let err = client
        .call_with_timeout("slow", vec![], Duration::from_millis(100))
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Timeout { method, .. } if method == "slow");

    // The server answers the abandoned call long after the caller gave up.
    let requests = server.wait_for_requests(1).await;
    let stale_id = requests[0].id();
    server
        .push(Frame::Response {
            id: stale_id,
            error: Value::Nil,
            result: Value::from("late"),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // No panic, no cross-talk: the connection still works.
    assert_eq!(client.call("get_me", vec![]).await.unwrap(), Value::from("me"));
}

#[tokio::test]
async fn unknown_response_id_is_ignored() {
    let server = MockServer::start().await;
    server.on_result("get_me", Value::from("me"));
    let client = connected_client(&server).await;

    server
        .push(Frame::Response {
            id: 999,
            error: Value::Nil,
            result: Value::from("stray"),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(client.call("get_me", vec![]).await.unwrap(), Value::from("me"));
}

// ─── Connection lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn call_before_connect_fails_fast() {
    let client = Client::new(Options::new().with_endpoint("ws://127.0.0.1:1"));
    let err = client.call("get_me", vec![]).await.unwrap_err();
    assert_matches!(err, ClientError::NotConnected);
}

#[tokio::test]
async fn connected_event_fires_after_handshake() {
    let server = MockServer::start().await;
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    let mut connected = event_channel(&client, events::CONNECTED);
    client.connect().await.unwrap();
    let _ = recv(&mut connected).await;
}

#[tokio::test]
async fn connect_twice_is_rejected() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    let err = client.connect().await.unwrap_err();
    assert_matches!(err, ClientError::Connect { context } => {
        assert!(context.contains("already connected"));
    });
}

#[tokio::test]
async fn invalid_endpoint_is_a_connect_error() {
    let client = Client::new(Options::new().with_endpoint("not a url"));
    let err = client.connect().await.unwrap_err();
    assert_matches!(err, ClientError::Connect { .. });
}

#[tokio::test]
async fn close_is_idempotent_and_sends_fail_fast() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    client.close().await;
    client.close().await;

    let err = client.call("get_me", vec![]).await.unwrap_err();
    assert_matches!(err, ClientError::NotConnected);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notification_reaches_subscriber_queue_and_is_acked() {
    let server = MockServer::start().await;
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    let mut notify_events = event_channel(&client, events::NOTIFY_CREATE_MESSAGE);
    let mut messages = client.take_messages().unwrap();
    client.connect().await.unwrap();

    server
        .notify(7, events::NOTIFY_CREATE_MESSAGE, message_payload("m1", "t1", "hi"))
        .await;

    // Generic event path sees the raw payload.
    let payload = recv(&mut notify_events).await;
    assert_eq!(
        talkwire_core::value::field(&payload, "id").and_then(Value::as_str),
        Some("m1")
    );

    // Dedicated queue sees the parsed record.
    let message = tokio::time::timeout(WAIT, messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.id, "m1");
    assert_eq!(message.talk_id, "t1");
    assert_eq!(message.text, "hi");

    // And exactly one [1, 7, nil, true] goes back.
    let acks = server.wait_for_acks(1).await;
    assert_eq!(acks, vec![Frame::ack(7)]);
}

#[tokio::test]
async fn notification_without_subscriber_is_still_acked() {
    let server = MockServer::start().await;
    let _client = connected_client(&server).await;

    server
        .notify(9, "notify_update_talk", Value::from("whatever"))
        .await;

    let acks = server.wait_for_acks(1).await;
    assert_eq!(acks, vec![Frame::ack(9)]);
}

#[tokio::test]
async fn decode_error_does_not_kill_the_read_loop() {
    let server = MockServer::start().await;
    server.on_result("get_me", Value::from("me"));
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    let mut decode_errors = event_channel(&client, events::DECODE_ERROR);
    client.connect().await.unwrap();

    server.push_raw(vec![0xc1, 0xff, 0x00]).await;
    let _ = recv(&mut decode_errors).await;

    // Valid traffic continues to flow.
    assert_eq!(client.call("get_me", vec![]).await.unwrap(), Value::from("me"));
}

#[tokio::test]
async fn full_queue_sheds_newest_messages() {
    let server = MockServer::start().await;
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    let mut messages = client.take_messages().unwrap();
    client.connect().await.unwrap();

    // Capacity is 100; send 105 without draining.
    for i in 0..105u64 {
        server
            .notify(
                i + 1,
                events::NOTIFY_CREATE_MESSAGE,
                message_payload(&format!("m{i}"), "t1", "x"),
            )
            .await;
    }
    let _ = server.wait_for_acks(105).await;

    let mut drained = Vec::new();
    while let Ok(message) = messages.try_recv() {
        drained.push(message);
    }
    assert_eq!(drained.len(), 100);
    // Oldest survive; the overflow was shed from the tail.
    assert_eq!(drained[0].id, "m0");
    assert_eq!(drained[99].id, "m99");
}

#[tokio::test]
async fn handler_can_issue_nested_calls() {
    let server = MockServer::start().await;
    server.on_result("get_me", Value::from("nested ok"));
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let nested = client.clone();
    client.on("notify_poke", move |_| {
        let client = nested.clone();
        let tx = tx.clone();
        async move {
            let result = client.call("get_me", vec![]).await.unwrap();
            let _ = tx.send(result);
        }
    });
    client.connect().await.unwrap();

    server.notify(3, "notify_poke", Value::Nil).await;

    let result = recv(&mut rx).await;
    assert_eq!(result, Value::from("nested ok"));
}

#[tokio::test]
async fn talk_domain_cache_enriches_queued_messages() {
    let server = MockServer::start().await;
    server.on_result(
        "get_talks",
        Value::Array(vec![Value::Map(vec![
            (Value::from("id"), Value::from("t1")),
            (Value::from("domain_id"), Value::from("d9")),
            (Value::from("type"), Value::from(2u64)),
        ])]),
    );
    let client = Client::new(Options::new().with_endpoint(server.url.as_str()));
    let mut messages = client.take_messages().unwrap();
    client.connect().await.unwrap();

    let talks = client.get_talks().await.unwrap();
    assert_eq!(talks.len(), 1);

    // The notification itself carries no domain_id.
    server
        .notify(5, events::NOTIFY_CREATE_MESSAGE, message_payload("m1", "t1", "hi"))
        .await;

    let message = tokio::time::timeout(WAIT, messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.domain_id.as_deref(), Some("d9"));
}

// ─── Session bootstrap ───────────────────────────────────────────────────────

fn script_bootstrap(server: &MockServer, start_result: Value) {
    server.on_result("create_session", Value::Map(vec![]));
    server.on_result("get_domains", Value::Array(vec![]));
    server.on_result(
        "get_talks",
        Value::Array(vec![Value::Map(vec![
            (Value::from("id"), Value::from("t1")),
            (Value::from("domain_id"), Value::from("d1")),
            (Value::from("type"), Value::from(1u64)),
        ])]),
    );
    server.on_result("get_talk_statuses", Value::Array(vec![]));
    server.on_result("start_notification", start_result);
}

#[tokio::test]
async fn bootstrap_runs_initialization_sequence() {
    let server = MockServer::start().await;
    script_bootstrap(&server, Value::Boolean(true));

    let client = Client::new(
        Options::new()
            .with_endpoint(server.url.as_str())
            .with_access_token("token-1"),
    );
    let mut session_created = event_channel(&client, events::SESSION_CREATED);
    let mut data_recovered = event_channel(&client, events::DATA_RECOVERED);
    client.connect().await.unwrap();

    let _ = recv(&mut session_created).await;
    let _ = recv(&mut data_recovered).await;
    assert!(client.is_connected());

    assert_eq!(
        server.received_methods(),
        vec![
            "create_session",
            "get_domains",
            "get_talks",
            "get_talk_statuses",
            "start_notification",
        ]
    );
}

#[tokio::test]
async fn bootstrap_retries_after_notification_refusal() {
    let server = MockServer::start().await;
    // First start_notification refuses; after reset it succeeds.
    let attempts = Arc::new(AtomicUsize::new(0));
    script_bootstrap(&server, Value::Boolean(true));
    {
        let attempts = Arc::clone(&attempts);
        server.on("start_notification", move |_| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Value::Boolean(false))
            } else {
                Ok(Value::Boolean(true))
            }
        });
    }
    server.on_result("reset_notification", Value::Boolean(true));
    server.on_result("update_last_used_at", Value::Boolean(true));

    let client = Client::new(
        Options::new()
            .with_endpoint(server.url.as_str())
            .with_access_token("token-1"),
    );
    let mut data_recovered = event_channel(&client, events::DATA_RECOVERED);
    client.connect().await.unwrap();

    let _ = recv(&mut data_recovered).await;

    let methods = server.received_methods();
    let tail: Vec<&str> = methods.iter().map(String::as_str).skip(4).collect();
    assert_eq!(
        tail,
        vec![
            "start_notification",
            "reset_notification",
            "start_notification",
            "update_last_used_at",
        ]
    );
}

#[tokio::test]
async fn rejected_session_emits_session_error() {
    let server = MockServer::start().await;
    server.on_error(
        "create_session",
        Value::Map(vec![(Value::from("message"), Value::from("bad token"))]),
    );

    let client = Client::new(
        Options::new()
            .with_endpoint(server.url.as_str())
            .with_access_token("expired"),
    );
    let mut session_errors = event_channel(&client, events::SESSION_ERROR);
    client.connect().await.unwrap();

    let error = recv(&mut session_errors).await;
    assert_eq!(
        talkwire_core::value::field(&error, "message").and_then(Value::as_str),
        Some("bad token")
    );
    assert!(!client.is_connected());
}
