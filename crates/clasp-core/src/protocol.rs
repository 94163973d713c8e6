//! JSON message router between native code and `clasp.js`.
//!
//! [`Protocol`] owns a table of call handlers and an [`UpdateQueue`]. It is
//! installed on a webview as the `__clasp` binding; incoming calls are routed
//! to handlers and answered with `reply` messages, while queued parameter and
//! MIDI updates are flushed to the page by [`Protocol::process_queue`].
//!
//! ```rust
//! use clasp_core::{Protocol, ScriptSink};
//! use serde_json::json;
//!
//! struct Console;
//! impl ScriptSink for Console {
//!     fn evaluate_script(&self, js: &str) {
//!         println!("{js}");
//!     }
//! }
//!
//! let proto = Protocol::new();
//! proto.on_call("add", |args| {
//!     let sum: f64 = args.iter().filter_map(|v| v.as_f64()).sum();
//!     Ok(json!(sum))
//! });
//!
//! // Audio thread:
//! proto.queue_param_change(0, 0.5);
//!
//! // UI thread:
//! proto.process_queue(&Console);
//! ```

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::CallError;
use crate::escape::escape_js;
use crate::message::{CallRequest, Incoming, Outgoing, Reply, outgoing_from_pending};
use crate::queue::UpdateQueue;
use crate::script::{CLASP_JS, ScriptHost, ScriptSink};
use crate::types::JsMessage;

/// Name of the page function carrying protocol messages to native code.
pub const BINDING_NAME: &str = "__clasp";

/// Page function receiving protocol messages from native code.
pub const RECEIVE_FN: &str = "__clasp_recv";

/// What every binding invocation returns to the page.
const EMPTY_RESULT: &str = "{}";

/// Handler for `clasp.invoke(name, ...args)`.
pub type CallHandler = dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync;

/// Receiver for `clasp.send(type, payload)`.
pub type MessageHandler = dyn Fn(&JsMessage) + Send + Sync;

struct ProtocolInner {
    handlers: RwLock<HashMap<String, Arc<CallHandler>>>,
    message_handler: RwLock<Option<Arc<MessageHandler>>>,
    queue: UpdateQueue,
}

/// Protocol handler for `clasp.js` communication.
///
/// Cloning is cheap; clones share handlers and the update queue, so one clone
/// can live in the audio thread while another sits in the webview binding.
#[derive(Clone)]
pub struct Protocol {
    inner: Arc<ProtocolInner>,
}

impl Protocol {
    /// Create a protocol with no handlers and an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProtocolInner {
                handlers: RwLock::new(HashMap::new()),
                message_handler: RwLock::new(None),
                queue: UpdateQueue::new(),
            }),
        }
    }

    /// Install the page-side script and the `__clasp` binding on `host`.
    pub fn attach<H: ScriptHost + ?Sized>(&self, host: &mut H) {
        host.add_init_script(CLASP_JS);
        let protocol = self.clone();
        host.bind(
            BINDING_NAME,
            Box::new(move |args, sink| protocol.handle_message(args, sink)),
        );
    }

    /// Register (or replace) the handler for `name`.
    pub fn on_call<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.inner
            .handlers
            .write()
            .insert(name.into(), Arc::new(handler));
    }

    /// Remove the handler for `name`. Returns whether one was registered.
    pub fn remove_call(&self, name: &str) -> bool {
        self.inner.handlers.write().remove(name).is_some()
    }

    /// Receive fire-and-forget messages from the page.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(&JsMessage) + Send + Sync + 'static,
    {
        *self.inner.message_handler.write() = Some(Arc::new(handler));
    }

    /// The queue backing the `queue_*` methods.
    pub fn queue(&self) -> &UpdateQueue {
        &self.inner.queue
    }

    /// Queue a single parameter update (throttled per parameter).
    ///
    /// Safe to call from the audio thread.
    pub fn queue_param_change(&self, id: u32, value: f32) -> bool {
        self.inner.queue.queue_param(id, value)
    }

    /// Queue a batch of parameter values, e.g. after a preset load.
    pub fn queue_bulk_param_update(&self, params: &[(u32, f32)]) {
        self.inner.queue.queue_bulk(params);
    }

    /// Queue a note on.
    pub fn queue_note_on(&self, channel: i16, key: i16, velocity: f32) {
        self.inner.queue.queue_note_on(channel, key, velocity);
    }

    /// Queue a note off.
    pub fn queue_note_off(&self, channel: i16, key: i16) {
        self.inner.queue.queue_note_off(channel, key);
    }

    /// Queue a MIDI control change.
    pub fn queue_midi_cc(&self, channel: i16, cc: u8, value: u8) {
        self.inner.queue.queue_midi_cc(channel, cc, value);
    }

    /// Set the parameter throttle rate; `hz` outside `1..=1000` is ignored.
    pub fn set_update_rate_hz(&self, hz: u32) -> bool {
        self.inner.queue.set_update_rate_hz(hz)
    }

    /// Flush queued updates to the page. Call on the UI thread.
    pub fn process_queue(&self, sink: &dyn ScriptSink) {
        for msg in outgoing_from_pending(self.inner.queue.drain()) {
            send_to_js(sink, &msg);
        }
    }

    /// Tell the page the native side is ready.
    pub fn send_ready(&self, sink: &dyn ScriptSink) {
        send_to_js(sink, &Outgoing::Ready);
    }

    /// Send a custom message `{"t": kind, ...payload}`.
    ///
    /// Fields of an object `payload` are merged next to `t`; any other payload
    /// is dropped and only `t` is sent.
    pub fn send(&self, sink: &dyn ScriptSink, kind: &str, payload: &Value) {
        let mut msg = serde_json::Map::new();
        msg.insert("t".to_owned(), Value::from(kind));
        if let Value::Object(fields) = payload {
            for (key, value) in fields {
                if key != "t" {
                    msg.insert(key.clone(), value.clone());
                }
            }
        }
        send_to_js(sink, &Value::Object(msg));
    }

    /// Entry point of the `__clasp` binding.
    ///
    /// `args_json` is the binding's argument array; its first element is the
    /// message JSON as a string. Malformed input is ignored. Always returns
    /// `"{}"`; replies travel separately through `sink`.
    pub fn handle_message(&self, args_json: &str, sink: &dyn ScriptSink) -> String {
        let Some(incoming) = Incoming::from_binding_args(args_json) else {
            tracing::debug!("clasp: ignoring malformed binding arguments");
            return EMPTY_RESULT.to_owned();
        };

        match incoming {
            Incoming::Call(call) => self.handle_call(&call, sink),
            Incoming::Message { kind, payload } => self.dispatch_message(kind, &payload),
            Incoming::Other(t) => tracing::debug!(t = %t, "clasp: ignoring message type"),
        }

        EMPTY_RESULT.to_owned()
    }

    /// Run the handler for `call` and send its reply.
    pub fn handle_call(&self, call: &CallRequest, sink: &dyn ScriptSink) {
        let handler = self.inner.handlers.read().get(&call.name).cloned();

        let outcome = match handler {
            Some(handler) => run_handler(handler.as_ref(), &call.args),
            None => Err(CallError::UnknownFunction(call.name.clone())),
        };

        match outcome {
            Ok(result) => send_to_js(sink, &Reply::ok(call.id, &result)),
            Err(e) => {
                tracing::debug!(function = %call.name, error = %e, "clasp: call failed");
                let error = e.to_string();
                send_to_js(sink, &Reply::err(call.id, &error));
            }
        }
    }

    fn dispatch_message(&self, kind: String, payload: &Value) {
        let handler = self.inner.message_handler.read().clone();
        if let Some(handler) = handler {
            handler(&JsMessage {
                kind,
                payload: payload.to_string(),
            });
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.inner.handlers.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Protocol")
            .field("handlers", &names)
            .field("queue", &self.inner.queue)
            .finish()
    }
}

/// Invoke a handler, turning a panic into a [`CallError::Panicked`].
fn run_handler(handler: &CallHandler, args: &[Value]) -> Result<Value, CallError> {
    catch_unwind(AssertUnwindSafe(|| handler(args))).unwrap_or_else(|panic| {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Err(CallError::Panicked(reason))
    })
}

/// Serialize `msg` and deliver it through `__clasp_recv('...')`.
fn send_to_js<T: Serialize + ?Sized>(sink: &dyn ScriptSink, msg: &T) {
    match serde_json::to_string(msg) {
        Ok(json) => sink.evaluate_script(&format!("{RECEIVE_FN}('{}');", escape_js(&json))),
        Err(e) => tracing::warn!(error = %e, "clasp: failed to encode message"),
    }
}
