//! The embedded webview and its lifecycle.
//!
//! A [`WebView`] goes through three states:
//!
//! 1. constructed: bindings, page source and init scripts can be configured;
//! 2. created (`create()`): ready to accept a parent window;
//! 3. attached (`set_parent()`): a native child view exists inside the host
//!    window and scripts reach the page.
//!
//! Everything here runs on the UI thread except the handle returned by
//! [`WebView::updates`], which the audio thread uses to queue events.

use std::collections::HashMap;
use std::sync::Arc;

use clasp_core::script::{ScriptHost, ScriptSink, bootstrap_script, hook_call};
use clasp_core::{
    BindingCallback, JsMessage, NativeWindow, UpdateQueue, WebViewOptions, WindowApi, json_f32,
};
use serde_json::{Value, json};

use crate::backend::{Backend, BackendConfig, BackendFactory, PageSource, default_factory};
use crate::error::WebViewError;
use crate::ipc::{IPC_JS, IpcInbox, IpcMessage, bind_script, reject_script, resolve_script};

/// Initial size used until the host calls `set_size`.
pub const DEFAULT_SIZE: (u32, u32) = (800, 600);

type MessageCallback = Box<dyn Fn(&JsMessage)>;
type ReadyCallback = Box<dyn Fn()>;

/// A platform webview embedded as a child of a host window.
pub struct WebView {
    options: WebViewOptions,
    factory: Box<dyn BackendFactory>,
    backend: Option<Box<dyn Backend>>,
    created: bool,
    parent: Option<NativeWindow>,
    width: u32,
    height: u32,
    visible: bool,
    source: Option<PageSource>,
    bootstrap: String,
    extra_scripts: Vec<String>,
    bindings: HashMap<String, Arc<BindingCallback>>,
    message_callback: Option<MessageCallback>,
    ready_callback: Option<ReadyCallback>,
    inbox: IpcInbox,
    updates: UpdateQueue,
    #[cfg(windows)]
    keypress: Option<crate::fixes::keypress_win::KeypressWorkaround>,
}

impl WebView {
    /// Create a webview using the compiled-in native backend.
    pub fn new(options: WebViewOptions) -> Self {
        Self::with_backend(options, default_factory())
    }

    /// Create a webview using `factory` to build the native view.
    pub fn with_backend(options: WebViewOptions, factory: Box<dyn BackendFactory>) -> Self {
        Self {
            options,
            factory,
            backend: None,
            created: false,
            parent: None,
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            visible: true,
            source: None,
            bootstrap: String::new(),
            extra_scripts: Vec::new(),
            bindings: HashMap::new(),
            message_callback: None,
            ready_callback: None,
            inbox: IpcInbox::new(),
            updates: UpdateQueue::new(),
            #[cfg(windows)]
            keypress: None,
        }
    }

    /// Whether a native webview backend is compiled in.
    pub fn is_available() -> bool {
        cfg!(feature = "native")
    }

    /// Whether a parent of type `api` can be embedded into on this platform.
    pub fn is_api_supported(api: WindowApi) -> bool {
        WindowApi::is_supported(api)
    }

    /// The window API hosts should offer on this platform.
    pub fn preferred_api() -> WindowApi {
        WindowApi::preferred()
    }

    /// Options this webview was built with.
    pub fn options(&self) -> &WebViewOptions {
        &self.options
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Prepare the webview. Idempotent.
    pub fn create(&mut self) -> Result<(), WebViewError> {
        if self.created {
            return Ok(());
        }
        if !self.factory.is_available() {
            tracing::warn!("webview: no native backend available");
            return Err(WebViewError::Unavailable);
        }
        self.bootstrap = bootstrap_script(&self.options);
        self.created = true;
        tracing::debug!("webview created");
        Ok(())
    }

    /// Drop the native view and forget the parent. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.backend.take().is_some() {
            tracing::debug!("webview detached");
        }
        self.parent = None;
        self.created = false;
        #[cfg(windows)]
        {
            self.keypress = None;
        }
    }

    /// Whether `create()` succeeded and `destroy()` has not been called since.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Whether a native child view currently exists.
    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Embed the view into `window` and size it to the current size.
    ///
    /// Re-parenting drops the previous child and builds a new one.
    pub fn set_parent(&mut self, window: NativeWindow) -> Result<(), WebViewError> {
        if !self.created {
            return Err(WebViewError::NotCreated);
        }
        if window.is_null() {
            return Err(WebViewError::NullParent);
        }
        if !Self::is_api_supported(window.api) {
            return Err(WebViewError::UnsupportedApi(window.api));
        }

        self.backend = None;
        let config = BackendConfig {
            parent: window,
            width: self.width,
            height: self.height,
            visible: self.visible,
            debug: self.options.enable_debug_mode,
            init_script: self.init_script(),
            source: self.source.clone(),
            inbox: self.inbox.clone(),
        };
        let backend = self.factory.attach(config)?;
        backend.set_size(self.width, self.height)?;
        self.backend = Some(backend);
        self.parent = Some(window);

        #[cfg(windows)]
        {
            self.keypress = Some(crate::fixes::keypress_win::KeypressWorkaround::new(
                0,
                window.handle,
            ));
        }
        Ok(())
    }

    /// Parent window the view is attached to.
    pub fn native_handle(&self) -> Option<NativeWindow> {
        self.parent
    }

    /// Record a new size and apply it to the child view.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), WebViewError> {
        if !self.created {
            return Err(WebViewError::NotCreated);
        }
        self.width = width;
        self.height = height;
        if let Some(backend) = &self.backend {
            backend.set_size(width, height)?;
        }
        Ok(())
    }

    /// Current size in logical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Show the child view. Returns `is_created()`.
    pub fn show(&mut self) -> bool {
        self.set_visible(true)
    }

    /// Hide the child view. Returns `is_created()`.
    pub fn hide(&mut self) -> bool {
        self.set_visible(false)
    }

    fn set_visible(&mut self, visible: bool) -> bool {
        if !self.created {
            return false;
        }
        self.visible = visible;
        if let Some(backend) = &self.backend
            && let Err(e) = backend.set_visible(visible)
        {
            tracing::warn!(error = %e, visible, "webview: visibility change failed");
        }
        true
    }

    // ── Content ─────────────────────────────────────────────────────────────

    /// Navigate to `url`, now or once attached.
    pub fn navigate(&mut self, url: &str) -> Result<(), WebViewError> {
        self.source = Some(PageSource::Url(url.to_owned()));
        match &self.backend {
            Some(backend) => backend.load_url(url),
            None => Ok(()),
        }
    }

    /// Show `html`, now or once attached.
    pub fn load_html(&mut self, html: &str) -> Result<(), WebViewError> {
        self.source = Some(PageSource::Html(html.to_owned()));
        match &self.backend {
            Some(backend) => backend.load_html(html),
            None => Ok(()),
        }
    }

    /// Run `js` in the page. Dropped when no child view exists.
    pub fn evaluate_script(&self, js: &str) {
        match &self.backend {
            Some(backend) => {
                if let Err(e) = backend.evaluate_script(js) {
                    tracing::debug!(error = %e, "webview: script failed");
                }
            }
            None => tracing::debug!("webview: dropping script, not attached"),
        }
    }

    /// Full script injected at the start of every page load: IPC prelude,
    /// binding stubs, bootstrap API, then scripts added with
    /// [`add_init_script`](ScriptHost::add_init_script).
    pub fn init_script(&self) -> String {
        let mut script = String::from(IPC_JS);
        let mut names: Vec<&String> = self.bindings.keys().collect();
        names.sort();
        for name in names {
            script.push('\n');
            script.push_str(&bind_script(name));
        }
        script.push('\n');
        if self.created {
            script.push_str(&self.bootstrap);
        } else {
            script.push_str(&bootstrap_script(&self.options));
        }
        for extra in &self.extra_scripts {
            script.push('\n');
            script.push_str(extra);
        }
        script
    }

    // ── Bindings and Messages ───────────────────────────────────────────────

    /// Expose `callback` to the page as `window.<name>(...)`.
    ///
    /// The callback receives the call's arguments as a JSON array and a sink
    /// for pushing script back; its return value settles the page's promise.
    pub fn bind<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&str, &dyn ScriptSink) -> String + Send + Sync + 'static,
    {
        self.insert_binding(name, Box::new(callback));
    }

    /// Remove a binding. The page-side stub stays until the next load.
    pub fn unbind(&mut self, name: &str) -> bool {
        self.bindings.remove(name).is_some()
    }

    fn insert_binding(&mut self, name: &str, callback: BindingCallback) {
        let fresh = self
            .bindings
            .insert(name.to_owned(), Arc::new(callback))
            .is_none();
        if fresh && self.backend.is_some() {
            self.evaluate_script(&bind_script(name));
        }
    }

    /// Receive `clasp.postMessage(type, payload)` from the page.
    pub fn set_message_callback(&mut self, callback: impl Fn(&JsMessage) + 'static) {
        self.message_callback = Some(Box::new(callback));
    }

    /// Called once per page load when the page signals it is ready.
    pub fn set_ready_callback(&mut self, callback: impl Fn() + 'static) {
        self.ready_callback = Some(Box::new(callback));
    }

    /// Call `window.clasp.onMessage(kind, payload)` in the page.
    pub fn post_message(&self, kind: &str, payload: &Value) {
        let args = format!("{}, {}", Value::from(kind), payload);
        self.evaluate_script(&hook_call("onMessage", &args));
    }

    /// Call `wake` from any thread whenever page traffic arrives, so the
    /// host can schedule a UI tick that calls [`pump`](Self::pump).
    pub fn set_wake(&self, wake: impl Fn() + Send + Sync + 'static) {
        self.inbox.set_wake(wake);
    }

    /// The IPC inbox fed by the page.
    pub fn inbox(&self) -> &IpcInbox {
        &self.inbox
    }

    /// Open the web inspector. No-op unless debug mode is enabled.
    pub fn open_dev_tools(&self) -> bool {
        if !self.options.enable_debug_mode {
            return false;
        }
        match &self.backend {
            Some(backend) => {
                backend.open_dev_tools();
                true
            }
            None => false,
        }
    }

    /// Replay a key event on the host window (Windows key-focus workaround).
    #[cfg(windows)]
    pub fn forward_key(&self, key_code: u16, down: bool) -> bool {
        self.keypress.as_ref().is_some_and(|fix| {
            if down {
                fix.on_key_down(key_code)
            } else {
                fix.on_key_up(key_code)
            }
        })
    }

    /// Enable or disable the Windows key-focus workaround.
    #[cfg(windows)]
    pub fn set_keypress_workaround(&mut self, enabled: bool) {
        if let Some(fix) = &mut self.keypress {
            fix.set_enabled(enabled);
        }
    }

    /// UI-thread tick: toolkit events, page traffic, then queued updates.
    pub fn pump(&self) {
        if let Some(backend) = &self.backend {
            backend.poll();
        }
        for body in self.inbox.take() {
            self.dispatch_ipc(&body);
        }
        self.process_queued_updates();
    }

    fn dispatch_ipc(&self, body: &str) {
        match IpcMessage::parse(body) {
            Some(IpcMessage::Call { name, seq, args }) => {
                let callback = self.bindings.get(&name).cloned();
                match callback {
                    Some(callback) => {
                        let result = callback(&args, self);
                        self.evaluate_script(&resolve_script(seq, &result));
                    }
                    None => {
                        tracing::debug!(name = %name, "webview: call to unknown binding");
                        self.evaluate_script(&reject_script(seq, &format!("unknown binding: {name}")));
                    }
                }
            }
            Some(IpcMessage::Message(msg)) => {
                if let Some(callback) = &self.message_callback {
                    callback(&msg);
                }
            }
            Some(IpcMessage::Ready) => {
                tracing::debug!("webview: page ready");
                if let Some(callback) = &self.ready_callback {
                    callback();
                }
            }
            None => tracing::debug!(body, "webview: unrecognized IPC message"),
        }
    }

    // ── Update Queue ────────────────────────────────────────────────────────

    /// Handle for queuing updates from other threads.
    pub fn updates(&self) -> UpdateQueue {
        self.updates.clone()
    }

    /// Queue a parameter change (throttled per parameter).
    pub fn queue_param_update(&self, id: u32, value: f32) -> bool {
        self.updates.queue_param(id, value)
    }

    /// Queue a batch of parameter values.
    pub fn queue_bulk_param_update(&self, params: &[(u32, f32)]) {
        self.updates.queue_bulk(params);
    }

    /// Queue a note on.
    pub fn queue_note_on(&self, channel: i16, key: i16, velocity: f32) {
        self.updates.queue_note_on(channel, key, velocity);
    }

    /// Queue a note off.
    pub fn queue_note_off(&self, channel: i16, key: i16) {
        self.updates.queue_note_off(channel, key);
    }

    /// Queue a MIDI control change.
    pub fn queue_midi_cc(&self, channel: i16, cc: u8, value: u8) {
        self.updates.queue_midi_cc(channel, cc, value);
    }

    /// Set the parameter throttle rate; `hz` outside `1..=1000` is ignored.
    pub fn set_update_rate_hz(&self, hz: u32) -> bool {
        self.updates.set_update_rate_hz(hz)
    }

    /// Deliver queued updates to the page's `window.clasp.on*` hooks.
    pub fn process_queued_updates(&self) {
        let pending = self.updates.drain();
        if pending.is_empty() {
            return;
        }

        for p in &pending.params {
            let args = format!("{}, {}", p.id, json_f32(p.value));
            self.evaluate_script(&hook_call("onParamChange", &args));
        }
        if !pending.bulk_params.is_empty() {
            let batch: Vec<Value> = pending
                .bulk_params
                .iter()
                .map(|p| json!({ "id": p.id, "value": json_f32(p.value) }))
                .collect();
            self.evaluate_script(&hook_call("onParamsSync", &Value::from(batch).to_string()));
        }
        for n in &pending.notes {
            let script = if n.is_note_on {
                let args = format!("{}, {}, {}", n.channel, n.key, json_f32(n.velocity));
                hook_call("onNoteOn", &args)
            } else {
                hook_call("onNoteOff", &format!("{}, {}", n.channel, n.key))
            };
            self.evaluate_script(&script);
        }
        for c in &pending.ccs {
            let args = format!("{}, {}, {}", c.channel, c.cc, c.value);
            self.evaluate_script(&hook_call("onMidiCC", &args));
        }
    }
}

impl ScriptSink for WebView {
    fn evaluate_script(&self, js: &str) {
        WebView::evaluate_script(self, js);
    }
}

impl ScriptHost for WebView {
    fn bind(&mut self, name: &str, callback: BindingCallback) {
        self.insert_binding(name, callback);
    }

    fn add_init_script(&mut self, js: &str) {
        self.extra_scripts.push(js.to_owned());
        if self.backend.is_some() {
            self.evaluate_script(js);
        }
    }
}

impl Drop for WebView {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for WebView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bindings: Vec<&String> = self.bindings.keys().collect();
        bindings.sort();
        f.debug_struct("WebView")
            .field("created", &self.created)
            .field("attached", &self.backend.is_some())
            .field("parent", &self.parent)
            .field("size", &(self.width, self.height))
            .field("visible", &self.visible)
            .field("bindings", &bindings)
            .finish_non_exhaustive()
    }
}
