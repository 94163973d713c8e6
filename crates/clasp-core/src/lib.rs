//! Native side of the clasp plugin-to-webview bridge.
//!
//! This crate holds everything that does not need a real webview: the JSON
//! message protocol spoken with `clasp.js`, the lock-light update queue fed
//! from the audio thread, and the scripts injected into every page.
//!
//! # Threads
//!
//! | Thread | Calls |
//! |--------|-------|
//! | Audio | `queue_param_change`, `queue_note_on`, `queue_midi_cc`, ... |
//! | UI / main | `process_queue`, `handle_message`, `send` |
//!
//! Parameter updates are throttled per id (16 ms by default); updates that
//! arrive inside the window are dropped, not coalesced.
//!
//! # Example
//!
//! ```rust
//! use clasp_core::{Protocol, ScriptSink};
//! use serde_json::json;
//!
//! struct Log;
//! impl ScriptSink for Log {
//!     fn evaluate_script(&self, js: &str) {
//!         println!("{js}");
//!     }
//! }
//!
//! let proto = Protocol::new();
//! proto.on_call("getVersion", |_| Ok(json!("1.0.0")));
//! proto.queue_param_change(0, 0.5);
//! proto.process_queue(&Log);
//! ```

pub mod error;
pub mod escape;
pub mod message;
pub mod protocol;
pub mod queue;
pub mod script;
pub mod throttle;
pub mod types;

pub use error::CallError;
pub use escape::{escape_js, escape_json};
pub use message::{CallRequest, Incoming, Outgoing, json_f32};
pub use protocol::{BINDING_NAME, Protocol};
pub use queue::{MidiCcEvent, NoteEvent, ParamUpdate, PendingUpdates, UpdateQueue};
pub use script::{BindingCallback, ScriptHost, ScriptSink, bootstrap_script, hook_call};
pub use throttle::{DEFAULT_UPDATE_INTERVAL, MAX_THROTTLED_PARAMS, ParamThrottle};
pub use types::{JsMessage, NativeWindow, WebViewOptions, WindowApi};

pub use serde_json;
