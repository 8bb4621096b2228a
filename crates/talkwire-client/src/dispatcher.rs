//! Correlation state and notification routing.
//!
//! The dispatcher never touches the socket. It hands each caller a oneshot
//! receiver for the response, and tells the read loop what (if anything) to
//! write back for an inbound frame. Lock discipline: the pending and
//! subscriber maps are only held for map operations, never across I/O or
//! handler invocation.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use talkwire_core::{Frame, IncomingMessage, Value, events};

/// A boxed async event handler.
pub(crate) type EventHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Completion outcome of a call: the result payload or the server's error
/// payload, verbatim.
pub(crate) type CallOutcome = Result<Value, Value>;

/// One in-flight request awaiting its response.
struct PendingCall {
    /// Retained for diagnostics only.
    method: String,
    tx: oneshot::Sender<CallOutcome>,
}

/// What the read loop must do after routing one frame.
pub(crate) struct Routed {
    /// Acknowledgment to write back, present for every inbound request
    /// frame regardless of subscriber presence or outcome.
    pub(crate) ack: Option<Frame>,
    /// Parsed chat message, present for message notifications. Delivered
    /// to the bounded queue by the read loop (which owns the enrichment
    /// cache), keeping queue order equal to arrival order.
    pub(crate) message: Option<IncomingMessage>,
}

pub(crate) struct Dispatcher {
    /// Next request id. Starts at 1: id 0 is the server-side notification
    /// convention and is never allocated to a call.
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingCall>>,
    subscribers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Allocate the next request id. Ids are unique per connection and
    /// never reused within a session.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a pending call and hand back its completion slot.
    pub(crate) fn register(&self, id: u64, method: &str) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        let previous = self.pending.lock().insert(
            id,
            PendingCall {
                method: method.to_owned(),
                tx,
            },
        );
        debug_assert!(previous.is_none(), "request id reused");
        rx
    }

    /// Drop a pending call (timeout or failed send). A response arriving
    /// later for this id will be discarded silently by `route`.
    pub(crate) fn evict(&self, id: u64) {
        let _ = self.pending.lock().remove(&id);
    }

    /// Number of calls still awaiting a response.
    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Append a handler for an event name. Handlers are never deduplicated
    /// and never unregistered; the table lives as long as the client.
    pub(crate) fn subscribe(&self, event: &str, handler: EventHandler) {
        self.subscribers
            .write()
            .entry(event.to_owned())
            .or_default()
            .push(handler);
    }

    /// Fan an event out to its subscribers, one spawned task per handler.
    ///
    /// Fire-and-forget: a slow or panicking handler cannot block the read
    /// loop or the other handlers. Panics are caught and logged.
    pub(crate) fn emit(&self, event: &str, payload: &Value) {
        let handlers: Vec<EventHandler> = self
            .subscribers
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            let future = handler(payload.clone());
            let event = event.to_owned();
            drop(tokio::spawn(async move {
                if AssertUnwindSafe(future).catch_unwind().await.is_err() {
                    tracing::warn!(event = %event, "event handler panicked");
                }
            }));
        }
    }

    /// Route one inbound frame.
    pub(crate) fn route(&self, frame: Frame) -> Routed {
        match frame {
            Frame::Response { id, error, result } => {
                let call = self.pending.lock().remove(&id);
                match call {
                    Some(call) => {
                        let outcome = if error.is_nil() { Ok(result) } else { Err(error) };
                        if call.tx.send(outcome).is_err() {
                            // Caller timed out between eviction races; drop.
                            tracing::debug!(id, method = %call.method, "response after caller gave up");
                        }
                    }
                    None => {
                        tracing::debug!(id, "response for unknown id, discarding");
                    }
                }
                Routed {
                    ack: None,
                    message: None,
                }
            }
            Frame::Request { id, method, params } => {
                let payload = params.into_iter().next().unwrap_or(Value::Nil);
                tracing::debug!(id, method = %method, "server notification");

                let message = if method == events::NOTIFY_CREATE_MESSAGE {
                    IncomingMessage::parse(&payload)
                } else {
                    None
                };
                self.emit(&method, &payload);

                Routed {
                    ack: Some(Frame::ack(id)),
                    message,
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
