//! Embedded platform webview for CLAP plugin GUIs.
//!
//! [`WebView`] owns a native child view (WebView2, WKWebView or WebKitGTK via
//! `wry` when the `native` feature is on), injects the `window.clasp`
//! bootstrap API, and exposes bindings, navigation and script evaluation.
//! It implements [`clasp_core::ScriptHost`], so a [`clasp_core::Protocol`]
//! can attach to it directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use clasp_core::{NativeWindow, Protocol, WebViewOptions, WindowApi};
//! use clasp_webview::WebView;
//!
//! let mut view = WebView::new(WebViewOptions::default());
//! let proto = Protocol::new();
//! proto.attach(&mut view);
//!
//! view.load_html("<h1>hello</h1>").unwrap();
//! view.create().unwrap();
//! view.set_parent(NativeWindow::new(WindowApi::preferred(), 0x1234)).unwrap();
//!
//! // On every UI tick:
//! view.pump();
//! proto.process_queue(&view);
//! ```

pub mod backend;
mod error;
pub mod fixes;
pub mod ipc;
#[cfg(feature = "native")]
pub mod native;
pub mod platform;
mod webview;

pub use backend::{Backend, BackendConfig, BackendFactory, PageSource, UnavailableFactory};
pub use error::WebViewError;
pub use ipc::{IpcInbox, IpcMessage};
pub use platform::{parent_window_handle, simulate_dev_tools_shortcut};
pub use webview::{DEFAULT_SIZE, WebView};

#[cfg(windows)]
pub use fixes::keypress_win::KeypressWorkaround;
