//! WebView lifecycle, bindings and update delivery against a recording backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clasp_core::{NativeWindow, Protocol, ScriptSink, WebViewOptions, WindowApi};
use clasp_webview::{
    Backend, BackendConfig, BackendFactory, PageSource, UnavailableFactory, WebView, WebViewError,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct Log {
    configs: Vec<BackendConfig>,
    scripts: Vec<String>,
    sizes: Vec<(u32, u32)>,
    visible: Vec<bool>,
    loads: Vec<PageSource>,
    dev_tools: usize,
    polls: usize,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Log>>);

impl Recorder {
    fn webview(&self, options: WebViewOptions) -> WebView {
        WebView::with_backend(options, Box::new(self.clone()))
    }

    fn scripts(&self) -> Vec<String> {
        self.0.lock().scripts.clone()
    }

    fn clear_scripts(&self) {
        self.0.lock().scripts.clear();
    }

    /// Page-side `window.ipc.postMessage(body)`.
    fn post(&self, body: &Value) {
        let inbox = self.0.lock().configs.last().expect("attached").inbox.clone();
        inbox.push(body.to_string());
    }
}

struct RecordingBackend(Arc<Mutex<Log>>);

impl BackendFactory for Recorder {
    fn is_available(&self) -> bool {
        true
    }

    fn attach(&self, config: BackendConfig) -> Result<Box<dyn Backend>, WebViewError> {
        self.0.lock().configs.push(config);
        Ok(Box::new(RecordingBackend(Arc::clone(&self.0))))
    }
}

impl Backend for RecordingBackend {
    fn evaluate_script(&self, js: &str) -> Result<(), WebViewError> {
        self.0.lock().scripts.push(js.to_owned());
        Ok(())
    }

    fn load_url(&self, url: &str) -> Result<(), WebViewError> {
        self.0.lock().loads.push(PageSource::Url(url.to_owned()));
        Ok(())
    }

    fn load_html(&self, html: &str) -> Result<(), WebViewError> {
        self.0.lock().loads.push(PageSource::Html(html.to_owned()));
        Ok(())
    }

    fn set_size(&self, width: u32, height: u32) -> Result<(), WebViewError> {
        self.0.lock().sizes.push((width, height));
        Ok(())
    }

    fn set_visible(&self, visible: bool) -> Result<(), WebViewError> {
        self.0.lock().visible.push(visible);
        Ok(())
    }

    fn open_dev_tools(&self) {
        self.0.lock().dev_tools += 1;
    }

    fn poll(&self) {
        self.0.lock().polls += 1;
    }
}

fn parent() -> NativeWindow {
    NativeWindow::new(WindowApi::preferred(), 0x2a)
}

fn attached(rec: &Recorder, options: WebViewOptions) -> WebView {
    let mut view = rec.webview(options);
    view.create().unwrap();
    view.set_parent(parent()).unwrap();
    view
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn lifecycle_requires_create() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());

    assert!(!view.is_created());
    assert!(matches!(view.set_parent(parent()), Err(WebViewError::NotCreated)));
    assert!(matches!(view.set_size(10, 10), Err(WebViewError::NotCreated)));
    assert!(!view.show());
    assert!(!view.hide());

    view.create().unwrap();
    view.create().unwrap();
    assert!(view.is_created());
    assert!(view.show());

    view.destroy();
    assert!(!view.is_created());
    assert!(view.native_handle().is_none());
}

#[test]
fn unavailable_backend_cannot_create() {
    let mut view = WebView::with_backend(WebViewOptions::default(), Box::new(UnavailableFactory));
    assert!(matches!(view.create(), Err(WebViewError::Unavailable)));
}

#[test]
fn set_parent_validates_handle() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    view.create().unwrap();

    assert!(matches!(
        view.set_parent(NativeWindow::new(WindowApi::preferred(), 0)),
        Err(WebViewError::NullParent)
    ));
    assert!(matches!(
        view.set_parent(NativeWindow::new(WindowApi::Wayland, 1)),
        Err(WebViewError::UnsupportedApi(WindowApi::Wayland))
    ));
    assert!(!view.is_attached());
}

#[test]
fn attach_applies_size_and_pending_page() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    view.navigate("https://example.com/ui").unwrap();
    view.create().unwrap();
    view.set_size(640, 480).unwrap();
    view.set_parent(parent()).unwrap();

    assert_eq!(view.native_handle(), Some(parent()));
    let log = rec.0.lock();
    let config = &log.configs[0];
    assert_eq!((config.width, config.height), (640, 480));
    assert_eq!(config.source, Some(PageSource::Url("https://example.com/ui".into())));
    assert_eq!(log.sizes, vec![(640, 480)]);
    assert!(log.loads.is_empty());
}

#[test]
fn attached_view_forwards_calls() {
    let rec = Recorder::default();
    let mut view = attached(&rec, WebViewOptions::default());

    view.set_size(1024, 768).unwrap();
    view.hide();
    view.show();
    view.load_html("<p>hi</p>").unwrap();
    view.evaluate_script("1 + 1");

    let log = rec.0.lock();
    assert_eq!(log.sizes.last(), Some(&(1024, 768)));
    assert_eq!(log.visible, vec![false, true]);
    assert_eq!(log.loads, vec![PageSource::Html("<p>hi</p>".into())]);
    assert_eq!(log.scripts, vec!["1 + 1".to_owned()]);
}

#[test]
fn scripts_before_attach_are_dropped() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    view.create().unwrap();
    view.evaluate_script("lost()");
    view.set_parent(parent()).unwrap();
    assert!(rec.scripts().is_empty());
}

// ── Init Script ─────────────────────────────────────────────────────────────

#[test]
fn init_script_order() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions {
        init_script: "window.userInit = true;".into(),
        ..WebViewOptions::default()
    });
    view.bind("zeta", |_, _| String::new());
    view.bind("alpha", |_, _| String::new());
    view.create().unwrap();
    view.set_parent(parent()).unwrap();

    let script = rec.0.lock().configs[0].init_script.clone();
    let ipc = script.find("clasp._post = function").unwrap();
    let alpha = script.find(r#"window.clasp._bind("alpha");"#).unwrap();
    let zeta = script.find(r#"window.clasp._bind("zeta");"#).unwrap();
    let bootstrap = script.find("clasp.postMessage = function").unwrap();
    let user = script.find("window.userInit = true;").unwrap();
    assert!(ipc < alpha && alpha < zeta && zeta < bootstrap && bootstrap < user);
}

#[test]
fn debug_mode_reaches_backend() {
    let rec = Recorder::default();
    let view = attached(
        &rec,
        WebViewOptions {
            enable_debug_mode: true,
            ..WebViewOptions::default()
        },
    );
    assert!(rec.0.lock().configs[0].debug);
    assert!(view.open_dev_tools());
    assert_eq!(rec.0.lock().dev_tools, 1);
}

#[test]
fn dev_tools_need_debug_mode() {
    let rec = Recorder::default();
    let view = attached(&rec, WebViewOptions::default());
    assert!(!view.open_dev_tools());
    assert_eq!(rec.0.lock().dev_tools, 0);
}

// ── Bindings ────────────────────────────────────────────────────────────────

#[test]
fn binding_results_settle_page_promises() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    view.bind("sum", |args, _| {
        let args: Vec<f64> = serde_json::from_str(args).unwrap_or_default();
        args.iter().sum::<f64>().to_string()
    });
    view.bind("greet", |_, _| "hello".to_owned());
    view.bind("nothing", |_, _| String::new());
    view.create().unwrap();
    view.set_parent(parent()).unwrap();

    rec.post(&json!({"b": "sum", "i": 1, "a": [1.5, 2.5]}));
    rec.post(&json!({"b": "greet", "i": 2, "a": []}));
    rec.post(&json!({"b": "nothing", "i": 3, "a": []}));
    rec.post(&json!({"b": "missing", "i": 4, "a": []}));
    view.pump();

    assert_eq!(
        rec.scripts(),
        vec![
            "window.clasp._resolve(1, 4);".to_owned(),
            r#"window.clasp._resolve(2, "hello");"#.to_owned(),
            "window.clasp._resolve(3, undefined);".to_owned(),
            r#"window.clasp._reject(4, "unknown binding: missing");"#.to_owned(),
        ]
    );
    assert_eq!(rec.0.lock().polls, 1);
}

#[test]
fn binding_after_attach_installs_stub() {
    let rec = Recorder::default();
    let mut view = attached(&rec, WebViewOptions::default());
    view.bind("late", |_, _| String::new());
    view.bind("late", |_, _| "again".to_owned());
    assert_eq!(rec.scripts(), vec![r#"window.clasp._bind("late");"#.to_owned()]);
    assert!(view.unbind("late"));
}

#[test]
fn binding_callback_can_push_script() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    view.bind("ping", |_, sink: &dyn ScriptSink| {
        sink.evaluate_script("pong()");
        String::new()
    });
    view.create().unwrap();
    view.set_parent(parent()).unwrap();

    rec.post(&json!({"b": "ping", "i": 7, "a": []}));
    view.pump();
    assert_eq!(rec.scripts()[0], "pong()");
}

#[test]
fn messages_ready_and_wake() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());

    let messages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&messages);
    view.set_message_callback(move |m| seen.lock().push((m.kind.clone(), m.payload.clone())));

    let ready = Arc::new(AtomicUsize::new(0));
    let ready_count = Arc::clone(&ready);
    view.set_ready_callback(move || {
        ready_count.fetch_add(1, Ordering::SeqCst);
    });

    let wakes = Arc::new(AtomicUsize::new(0));
    let wake_count = Arc::clone(&wakes);
    view.set_wake(move || {
        wake_count.fetch_add(1, Ordering::SeqCst);
    });

    view.create().unwrap();
    view.set_parent(parent()).unwrap();

    rec.post(&json!({"r": true}));
    rec.post(&json!({"m": "resize", "p": {"w": 300}}));
    rec.post(&json!({"junk": 1}));
    assert_eq!(wakes.load(Ordering::SeqCst), 3);

    view.pump();
    assert_eq!(ready.load(Ordering::SeqCst), 1);
    assert_eq!(
        *messages.lock(),
        vec![("resize".to_owned(), r#"{"w":300}"#.to_owned())]
    );
    assert!(view.inbox().is_empty());
}

#[test]
fn post_message_calls_on_message_hook() {
    let rec = Recorder::default();
    let view = attached(&rec, WebViewOptions::default());
    view.post_message("theme", &json!({"dark": true}));
    assert_eq!(
        rec.scripts(),
        vec![
            r#"if (window.clasp && window.clasp.onMessage) { window.clasp.onMessage("theme", {"dark":true}); }"#
                .to_owned()
        ]
    );
}

// ── Update Queue ────────────────────────────────────────────────────────────

#[test]
fn queued_updates_reach_hooks() {
    let rec = Recorder::default();
    let view = attached(&rec, WebViewOptions::default());

    let audio = view.updates();
    std::thread::spawn(move || {
        audio.queue_param(3, 0.5);
        audio.queue_note_on(0, 60, 1.0);
    })
    .join()
    .unwrap();
    view.queue_bulk_param_update(&[(1, 0.25)]);
    view.queue_note_off(0, 60);
    view.queue_midi_cc(2, 74, 100);

    rec.clear_scripts();
    view.process_queued_updates();

    let guard = |hook: &str, args: &str| {
        format!("if (window.clasp && window.clasp.{hook}) {{ window.clasp.{hook}({args}); }}")
    };
    assert_eq!(
        rec.scripts(),
        vec![
            guard("onParamChange", "3, 0.5"),
            guard("onParamsSync", r#"[{"id":1,"value":0.25}]"#),
            guard("onNoteOn", "0, 60, 1.0"),
            guard("onNoteOff", "0, 60"),
            guard("onMidiCC", "2, 74, 100"),
        ]
    );

    rec.clear_scripts();
    view.process_queued_updates();
    assert!(rec.scripts().is_empty());
}

#[test]
fn hook_values_keep_f32_precision() {
    let rec = Recorder::default();
    let view = attached(&rec, WebViewOptions::default());
    view.queue_param_update(1, 0.1);
    view.queue_bulk_param_update(&[(2, 0.3)]);
    view.queue_note_on(0, 64, 0.7);

    rec.clear_scripts();
    view.process_queued_updates();

    let scripts = rec.scripts().join("\n");
    assert!(scripts.contains("window.clasp.onParamChange(1, 0.1);"), "{scripts}");
    assert!(
        scripts.contains(r#"window.clasp.onParamsSync([{"id":2,"value":0.3}]);"#),
        "{scripts}"
    );
    assert!(scripts.contains("window.clasp.onNoteOn(0, 64, 0.7);"), "{scripts}");
}

#[test]
fn view_throttles_param_updates() {
    let rec = Recorder::default();
    let view = rec.webview(WebViewOptions::default());
    assert!(view.queue_param_update(5, 0.1));
    assert!(!view.queue_param_update(5, 0.2));
    assert!(!view.set_update_rate_hz(0));
    assert!(view.set_update_rate_hz(120));
}

// ── Protocol on a WebView ───────────────────────────────────────────────────

#[test]
fn protocol_round_trip_through_ipc() {
    let rec = Recorder::default();
    let mut view = rec.webview(WebViewOptions::default());
    let proto = Protocol::new();
    proto.on_call("getVersion", |_| Ok(json!("1.2.3")));
    proto.attach(&mut view);
    view.create().unwrap();
    view.set_parent(parent()).unwrap();

    let init = rec.0.lock().configs[0].init_script.clone();
    assert!(init.contains(r#"window.clasp._bind("__clasp");"#));
    assert!(init.contains("__clasp_recv"));

    let msg = json!({"t": "call", "fn": "getVersion", "args": [], "id": 11}).to_string();
    rec.post(&json!({"b": "__clasp", "i": 1, "a": [msg]}));
    view.pump();

    let scripts = rec.scripts();
    assert_eq!(scripts.len(), 2);
    assert_eq!(
        scripts[0],
        r#"__clasp_recv('{"t":"reply","id":11,"result":"1.2.3"}');"#
    );
    assert_eq!(scripts[1], "window.clasp._resolve(1, {});");

    rec.clear_scripts();
    proto.queue_param_change(0, 0.75);
    proto.process_queue(&view);
    assert_eq!(rec.scripts(), vec![r#"__clasp_recv('{"t":"param","id":0,"v":0.75}');"#.to_owned()]);
}
