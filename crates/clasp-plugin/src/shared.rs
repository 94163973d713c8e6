//! Thread-safe state of the demo plugin.
//!
//! `DemoShared` is reachable from the main thread, the audio thread and the
//! page's call handlers. Parameter values live in atomics (f32 bit-cast to
//! `u32`). Values written by the page set a bit in a dirty mask; the audio
//! thread picks those up and reports them to the host as parameter events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use clasp_core::{CallError, Protocol, json_f32};
use serde_json::{Value, json};

use crate::params::{PARAM_COUNT, PARAMS, param_info};

type HostCallback = Box<dyn Fn() + Send + Sync>;

/// Parameter storage shared with the protocol's call handlers.
///
/// Kept apart from [`DemoShared`] so the handlers registered on the
/// [`Protocol`] do not hold a reference back to the protocol itself.
pub struct ParamStore {
    values: [AtomicU32; PARAM_COUNT],
    /// Bit `n` set: parameter `n` was changed by the page.
    gui_dirty: AtomicU32,
    request_process: Option<HostCallback>,
}

impl ParamStore {
    fn new(request_process: Option<HostCallback>) -> Self {
        Self {
            values: PARAMS.map(|p| AtomicU32::new(p.default.to_bits())),
            gui_dirty: AtomicU32::new(0),
            request_process,
        }
    }

    /// Current value of `id`.
    pub fn get(&self, id: u32) -> Option<f32> {
        self.values
            .get(id as usize)
            .map(|v| f32::from_bits(v.load(Ordering::Acquire)))
    }

    /// Store a clamped value. Returns what was stored.
    pub fn set(&self, id: u32, value: f32) -> Option<f32> {
        let info = param_info(id)?;
        let clamped = info.clamp(value);
        self.values[id as usize].store(clamped.to_bits(), Ordering::Release);
        Some(clamped)
    }

    /// Store a value coming from the page and ask the host for a process call
    /// so the change reaches it even while transport is stopped.
    pub fn set_from_gui(&self, id: u32, value: f32) -> Option<f32> {
        let stored = self.set(id, value)?;
        self.gui_dirty.fetch_or(1 << id, Ordering::AcqRel);
        if let Some(cb) = &self.request_process {
            cb();
        }
        Some(stored)
    }

    /// Take the set of page-changed parameter ids.
    pub fn take_gui_dirty(&self) -> u32 {
        self.gui_dirty.swap(0, Ordering::AcqRel)
    }

    /// Take the page-changed parameters along with their current values.
    pub fn drain_gui_changes(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        let dirty = self.take_gui_dirty();
        (0..PARAM_COUNT as u32)
            .filter(move |id| dirty & (1u32 << *id) != 0)
            .filter_map(move |id| self.get(id).map(|v| (id, v)))
    }

    /// `(id, value)` for every parameter.
    pub fn snapshot(&self) -> Vec<(u32, f32)> {
        PARAMS
            .iter()
            .filter_map(|p| self.get(p.id).map(|v| (p.id, v)))
            .collect()
    }
}

/// Shared state accessible from all plugin threads.
///
/// Cloning is cheap; clones share storage, protocol and host callbacks.
#[derive(Clone)]
pub struct DemoShared {
    params: Arc<ParamStore>,
    protocol: Protocol,
    request_callback: Option<Arc<HostCallback>>,
}

impl DemoShared {
    /// Create shared state and register the page-facing call handlers.
    ///
    /// `request_process` is called after the page changes a parameter;
    /// `request_callback` whenever work for the main thread is pending.
    /// Pass `None` for both outside a host.
    pub fn new(
        request_process: Option<HostCallback>,
        request_callback: Option<HostCallback>,
    ) -> Self {
        let params = Arc::new(ParamStore::new(request_process));
        let protocol = Protocol::new();
        register_handlers(&protocol, &params);
        Self {
            params,
            protocol,
            request_callback: request_callback.map(Arc::new),
        }
    }

    /// Parameter storage.
    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Protocol shared with the webview.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Ask the host to call `on_main_thread`.
    pub fn request_callback(&self) {
        if let Some(cb) = &self.request_callback {
            cb();
        }
    }

    /// Queue a host-side parameter change for the page and wake the main thread.
    ///
    /// Safe to call from the audio thread.
    pub fn notify_param(&self, id: u32, value: f32) {
        if self.protocol.queue_param_change(id, value) {
            self.request_callback();
        }
    }

    /// Queue every current value for the page, bypassing the throttle.
    pub fn notify_all_params(&self) {
        self.protocol
            .queue_bulk_param_update(&self.params.snapshot());
        self.request_callback();
    }
}

impl clack_plugin::prelude::PluginShared<'_> for DemoShared {}

fn register_handlers(protocol: &Protocol, params: &Arc<ParamStore>) {
    let store = Arc::clone(params);
    protocol.on_call("getParam", move |args| {
        let id = param_id(args)?;
        let value = store
            .get(id)
            .ok_or_else(|| CallError::invalid_arguments(format!("unknown parameter {id}")))?;
        Ok(json_f32(value))
    });

    let store = Arc::clone(params);
    protocol.on_call("setParam", move |args| {
        let id = param_id(args)?;
        let value = args
            .get(1)
            .and_then(Value::as_f64)
            .ok_or_else(|| CallError::invalid_arguments("expected (id, value)"))?;
        let stored = store
            .set_from_gui(id, value as f32)
            .ok_or_else(|| CallError::invalid_arguments(format!("unknown parameter {id}")))?;
        tracing::debug!(id, value = stored, "parameter set from GUI");
        Ok(json_f32(stored))
    });

    let store = Arc::clone(params);
    protocol.on_call("getParams", move |_args| {
        let list: Vec<Value> = PARAMS
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "min": json_f32(p.min),
                    "max": json_f32(p.max),
                    "default": json_f32(p.default),
                    "value": store.get(p.id).map(json_f32),
                })
            })
            .collect();
        Ok(Value::Array(list))
    });
}

fn param_id(args: &[Value]) -> Result<u32, CallError> {
    args.first()
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| CallError::invalid_arguments("expected a parameter id"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use clasp_core::ScriptSink;
    use parking_lot::Mutex;

    use super::*;
    use crate::params::{PARAM_GAIN, PARAM_PAN};

    #[derive(Default)]
    struct Sink(Mutex<Vec<String>>);

    impl ScriptSink for Sink {
        fn evaluate_script(&self, js: &str) {
            self.0.lock().push(js.to_owned());
        }
    }

    fn call(shared: &DemoShared, name: &str, args: Value) -> String {
        let sink = Sink::default();
        let request = json!({"t": "call", "id": 1, "fn": name, "args": args});
        let wire = json!([request.to_string()]).to_string();
        shared.protocol().handle_message(&wire, &sink);
        sink.0.lock().join("\n")
    }

    #[test]
    fn defaults_and_clamping() {
        let shared = DemoShared::new(None, None);
        assert_eq!(shared.params().get(PARAM_GAIN), Some(0.0));
        assert_eq!(shared.params().set(PARAM_PAN, 3.0), Some(1.0));
        assert_eq!(shared.params().get(PARAM_PAN), Some(1.0));
        assert_eq!(shared.params().set(9, 0.0), None);
    }

    #[test]
    fn gui_writes_mark_dirty_and_request_process() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let shared = DemoShared::new(
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })),
            None,
        );
        shared.params().set_from_gui(PARAM_PAN, -0.5);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(shared.params().take_gui_dirty(), 1 << PARAM_PAN);
        assert_eq!(shared.params().take_gui_dirty(), 0);
    }

    #[test]
    fn gui_changes_drain_once() {
        let shared = DemoShared::new(None, None);
        shared.params().set_from_gui(PARAM_GAIN, -3.0);
        shared.params().set_from_gui(PARAM_PAN, 0.5);
        shared.params().set(PARAM_GAIN, -9.0);
        let changes: Vec<_> = shared.params().drain_gui_changes().collect();
        assert_eq!(changes, vec![(PARAM_GAIN, -9.0), (PARAM_PAN, 0.5)]);
        assert_eq!(shared.params().drain_gui_changes().count(), 0);
    }

    #[test]
    fn set_param_call_round_trip() {
        let shared = DemoShared::new(None, None);
        let out = call(&shared, "setParam", json!([0, -12.0]));
        assert!(out.contains("reply"), "{out}");
        assert_eq!(shared.params().get(PARAM_GAIN), Some(-12.0));

        let out = call(&shared, "getParam", json!([0]));
        assert!(out.contains("-12.0"), "{out}");
    }

    #[test]
    fn replies_keep_f32_precision() {
        let shared = DemoShared::new(None, None);
        let out = call(&shared, "setParam", json!([PARAM_PAN, 0.3]));
        assert!(out.contains(r#""result":0.3}"#), "{out}");
        let out = call(&shared, "getParam", json!([PARAM_PAN]));
        assert!(out.contains(r#""result":0.3}"#), "{out}");
        assert!(!out.contains("0.30000001"), "{out}");
    }

    #[test]
    fn bad_arguments_are_reported() {
        let shared = DemoShared::new(None, None);
        let out = call(&shared, "getParam", json!(["gain"]));
        assert!(out.contains("expected a parameter id"), "{out}");
        let out = call(&shared, "setParam", json!([7, 1.0]));
        assert!(out.contains("unknown parameter 7"), "{out}");
    }

    #[test]
    fn notify_wakes_main_thread_unless_throttled() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let shared = DemoShared::new(
            None,
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })),
        );
        shared.notify_param(PARAM_GAIN, -3.0);
        shared.notify_param(PARAM_GAIN, -4.0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(shared.protocol().queue().has_pending());

        shared.notify_all_params();
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }
}
