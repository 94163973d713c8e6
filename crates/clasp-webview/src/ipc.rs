//! Page-to-native IPC channel.
//!
//! The page posts JSON envelopes through `window.ipc.postMessage`. The native
//! webview delivers them on its own schedule, so they are parked in an
//! [`IpcInbox`] and dispatched later by [`WebView::pump`](crate::WebView::pump)
//! on the UI thread.

use std::sync::Arc;

use clasp_core::JsMessage;
use parking_lot::Mutex;
use serde_json::Value;

/// Page-side IPC prelude (`clasp._post`, `clasp._bind`, `clasp._resolve`).
pub const IPC_JS: &str = include_str!("../assets/ipc.js");

type WakeFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct InboxInner {
    messages: Mutex<Vec<String>>,
    wake: Mutex<Option<WakeFn>>,
}

/// Thread-safe buffer of raw IPC bodies plus an optional wake-up hook.
#[derive(Clone, Default)]
pub struct IpcInbox {
    inner: Arc<InboxInner>,
}

impl IpcInbox {
    /// Create an empty inbox without a wake hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a raw message body and signal the wake hook.
    pub fn push(&self, body: String) {
        self.inner.messages.lock().push(body);
        let wake = self.inner.wake.lock().clone();
        if let Some(wake) = wake {
            wake();
        }
    }

    /// Take every parked body in arrival order.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.messages.lock())
    }

    /// Number of parked bodies.
    pub fn len(&self) -> usize {
        self.inner.messages.lock().len()
    }

    /// Whether nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Install the hook called after every [`push`](Self::push).
    pub fn set_wake(&self, wake: impl Fn() + Send + Sync + 'static) {
        *self.inner.wake.lock() = Some(Arc::new(wake));
    }

    /// Remove the wake hook.
    pub fn clear_wake(&self) {
        *self.inner.wake.lock() = None;
    }
}

impl std::fmt::Debug for IpcInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcInbox")
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}

/// A decoded IPC envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum IpcMessage {
    /// `{"b": name, "i": seq, "a": [...]}`: call of a bound native function.
    Call {
        /// Binding name.
        name: String,
        /// Page-side promise id.
        seq: u64,
        /// Arguments re-serialized as a JSON array.
        args: String,
    },
    /// `{"m": type, "p": payload}` from `clasp.postMessage`.
    Message(JsMessage),
    /// `{"r": true}` once the page has loaded.
    Ready,
}

impl IpcMessage {
    /// Decode one envelope. Returns `None` for anything unrecognized.
    pub fn parse(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let obj = value.as_object()?;

        if let Some(name) = obj.get("b").and_then(Value::as_str) {
            let seq = obj.get("i").and_then(Value::as_u64)?;
            let args = match obj.get("a") {
                Some(a @ Value::Array(_)) => a.to_string(),
                _ => "[]".to_owned(),
            };
            return Some(Self::Call {
                name: name.to_owned(),
                seq,
                args,
            });
        }

        if let Some(kind) = obj.get("m").and_then(Value::as_str) {
            let payload = obj.get("p").cloned().unwrap_or(Value::Null);
            return Some(Self::Message(JsMessage {
                kind: kind.to_owned(),
                payload: payload.to_string(),
            }));
        }

        if obj.get("r").and_then(Value::as_bool) == Some(true) {
            return Some(Self::Ready);
        }

        None
    }
}

/// Script settling the page-side promise `seq` with a binding's result.
///
/// An empty result resolves to `undefined`; valid JSON is passed through as
/// a value; anything else resolves to the text as a string.
pub fn resolve_script(seq: u64, result: &str) -> String {
    let value = if result.is_empty() {
        "undefined".to_owned()
    } else if serde_json::from_str::<Value>(result).is_ok() {
        result.to_owned()
    } else {
        Value::from(result).to_string()
    };
    format!("window.clasp._resolve({seq}, {value});")
}

/// Script rejecting the page-side promise `seq`.
pub fn reject_script(seq: u64, reason: &str) -> String {
    format!(
        "window.clasp._reject({seq}, {});",
        Value::from(reason)
    )
}

/// Script registering a binding stub for `name` in the page.
pub fn bind_script(name: &str) -> String {
    format!("window.clasp._bind({});", Value::from(name))
}
