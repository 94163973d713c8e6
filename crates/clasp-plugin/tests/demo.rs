//! Demo plugin wiring: host events reach the page, page calls reach the params.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clack_plugin::prelude::PluginMainThread;
use clasp_config::GuiConfig;
use clasp_core::{NativeWindow, WindowApi};
use clasp_plugin::params::{PARAM_GAIN, PARAM_PAN};
use clasp_plugin::{DemoMainThread, DemoShared, GuiHelper};
use clasp_webview::{Backend, BackendConfig, BackendFactory, WebViewError};
use parking_lot::Mutex;
use serde_json::json;

#[derive(Default)]
struct Log {
    configs: Vec<BackendConfig>,
    scripts: Vec<String>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Log>>);

impl Recorder {
    fn take_scripts(&self) -> Vec<String> {
        std::mem::take(&mut self.0.lock().scripts)
    }

    /// Page-side `clasp.invoke(name, ...args)`.
    fn invoke(&self, id: i64, name: &str, args: serde_json::Value) {
        let msg = json!({"t": "call", "id": id, "fn": name, "args": args}).to_string();
        let body = json!({"b": "__clasp", "i": id, "a": [msg]}).to_string();
        let inbox = self.0.lock().configs.last().expect("attached").inbox.clone();
        inbox.push(body);
    }

    fn page_ready(&self) {
        let inbox = self.0.lock().configs.last().expect("attached").inbox.clone();
        inbox.push(json!({"r": true}).to_string());
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

    fn load_url(&self, _url: &str) -> Result<(), WebViewError> {
        Ok(())
    }

    fn load_html(&self, _html: &str) -> Result<(), WebViewError> {
        Ok(())
    }

    fn set_size(&self, _width: u32, _height: u32) -> Result<(), WebViewError> {
        Ok(())
    }

    fn set_visible(&self, _visible: bool) -> Result<(), WebViewError> {
        Ok(())
    }
}

fn counter() -> (Arc<AtomicUsize>, Box<dyn Fn() + Send + Sync>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&hits);
    (
        hits,
        Box::new(move || {
            c.fetch_add(1, Ordering::Relaxed);
        }),
    )
}

fn open<'a>(shared: &'a DemoShared, recorder: &Recorder) -> DemoMainThread<'a> {
    let config = GuiConfig::default();
    let gui = GuiHelper::from_config_with_backend(&config, Box::new(recorder.clone()));
    let mut main = DemoMainThread::with_gui(shared, gui, &config);
    let gui = main.gui_mut();
    gui.create(WindowApi::preferred(), false).unwrap();
    gui.set_parent(NativeWindow::new(WindowApi::preferred(), 0xBEEF))
        .unwrap();
    gui.show().unwrap();
    main
}

#[test]
fn page_is_loaded_with_protocol_installed() {
    let shared = DemoShared::new(None, None);
    let recorder = Recorder::default();
    let _main = open(&shared, &recorder);

    let log = recorder.0.lock();
    let config = &log.configs[0];
    assert!(config.init_script.contains("__clasp_recv"));
    assert!(config.init_script.contains(r#"_bind("__clasp")"#));
    assert!(matches!(
        &config.source,
        Some(clasp_webview::PageSource::Html(html)) if html.contains("Clasp Demo")
    ));
}

#[test]
fn host_changes_reach_the_page_on_main_thread() {
    let (wakes, request_callback) = counter();
    let shared = DemoShared::new(None, Some(request_callback));
    let recorder = Recorder::default();
    let mut main = open(&shared, &recorder);
    recorder.take_scripts();

    // What the audio thread does for a host automation event.
    shared.params().set(PARAM_GAIN, -6.0);
    shared.notify_param(PARAM_GAIN, -6.0);
    shared.protocol().queue_note_on(0, 60, 0.5);
    assert_eq!(wakes.load(Ordering::Relaxed), 1);
    assert!(recorder.take_scripts().is_empty());

    main.on_main_thread();
    let scripts = recorder.take_scripts().join("\n");
    assert!(scripts.contains(r#"{"t":"param","id":0,"v":-6.0}"#), "{scripts}");
    assert!(scripts.contains(r#""t":"noteOn""#), "{scripts}");
}

#[test]
fn page_calls_set_params_and_resolve() {
    let (processes, request_process) = counter();
    let (wakes, request_callback) = counter();
    let shared = DemoShared::new(Some(request_process), Some(request_callback));
    let recorder = Recorder::default();
    let mut main = open(&shared, &recorder);
    recorder.take_scripts();

    recorder.invoke(4, "setParam", json!([PARAM_PAN, -0.25]));
    // The inbox wake asks the host for a main-thread callback.
    assert!(wakes.load(Ordering::Relaxed) >= 1);

    main.on_main_thread();
    assert_eq!(shared.params().get(PARAM_PAN), Some(-0.25));
    assert_eq!(processes.load(Ordering::Relaxed), 1);
    assert_eq!(shared.params().take_gui_dirty(), 1 << PARAM_PAN);

    let scripts = recorder.take_scripts().join("\n");
    assert!(scripts.contains(r#""t":"reply","id":4"#), "{scripts}");
    assert!(scripts.contains("_resolve(4"), "{scripts}");
}

#[test]
fn ready_page_receives_all_values() {
    let shared = DemoShared::new(None, None);
    let recorder = Recorder::default();
    let mut main = open(&shared, &recorder);
    shared.params().set(PARAM_GAIN, 3.0);
    recorder.take_scripts();

    // The ready callback queues the batch; the same tick delivers it.
    recorder.page_ready();
    main.on_main_thread();

    let scripts = recorder.take_scripts().join("\n");
    assert!(scripts.contains(r#""t":"params""#), "{scripts}");
    assert!(scripts.contains(r#"{"id":0,"v":3.0}"#), "{scripts}");
}
