//! `wry` backend: WebView2 on Windows, WKWebView on macOS, WebKitGTK on X11.

use raw_window_handle::{HandleError, HasWindowHandle, RawWindowHandle, WindowHandle};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::http::Request;
use wry::{Rect, WebViewBuilder};

use crate::backend::{Backend, BackendConfig, BackendFactory, PageSource};
use crate::error::WebViewError;
use crate::platform::parent_window_handle;

/// Builds `wry` child views.
#[derive(Debug, Default, Clone, Copy)]
pub struct WryFactory;

impl BackendFactory for WryFactory {
    fn is_available(&self) -> bool {
        true
    }

    fn attach(&self, config: BackendConfig) -> Result<Box<dyn Backend>, WebViewError> {
        #[cfg(target_os = "linux")]
        gtk_support::ensure_init()?;

        let parent = ParentWindow(parent_window_handle(config.parent)?);
        let inbox = config.inbox.clone();

        let mut builder = WebViewBuilder::new_as_child(&parent)
            .with_initialization_script(&config.init_script)
            .with_devtools(config.debug)
            .with_visible(config.visible)
            .with_bounds(bounds(config.width, config.height))
            .with_ipc_handler(move |req: Request<String>| inbox.push(req.into_body()));

        builder = match config.source {
            Some(PageSource::Url(url)) => builder.with_url(url),
            Some(PageSource::Html(html)) => builder.with_html(html),
            None => builder,
        };

        let webview = builder.build().map_err(WebViewError::backend)?;
        tracing::info!(
            api = config.parent.api.as_clap_str(),
            width = config.width,
            height = config.height,
            "webview attached"
        );
        Ok(Box::new(WryBackend { webview }))
    }
}

struct WryBackend {
    webview: wry::WebView,
}

impl Backend for WryBackend {
    fn evaluate_script(&self, js: &str) -> Result<(), WebViewError> {
        self.webview.evaluate_script(js).map_err(WebViewError::backend)
    }

    fn load_url(&self, url: &str) -> Result<(), WebViewError> {
        self.webview.load_url(url).map_err(WebViewError::backend)
    }

    fn load_html(&self, html: &str) -> Result<(), WebViewError> {
        self.webview.load_html(html).map_err(WebViewError::backend)
    }

    fn set_size(&self, width: u32, height: u32) -> Result<(), WebViewError> {
        self.webview
            .set_bounds(bounds(width, height))
            .map_err(WebViewError::backend)
    }

    fn set_visible(&self, visible: bool) -> Result<(), WebViewError> {
        self.webview
            .set_visible(visible)
            .map_err(WebViewError::backend)
    }

    fn open_dev_tools(&self) {
        self.webview.open_devtools();
    }

    fn poll(&self) {
        #[cfg(target_os = "linux")]
        gtk_support::pump();
    }
}

fn bounds(width: u32, height: u32) -> Rect {
    Rect {
        position: LogicalPosition::new(0, 0).into(),
        size: LogicalSize::new(width, height).into(),
    }
}

/// Host parent window seen through `raw-window-handle`.
struct ParentWindow(RawWindowHandle);

#[allow(unsafe_code)]
impl HasWindowHandle for ParentWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        // SAFETY: the host keeps the parent window alive between
        // `set_parent` and `destroy`, which bounds the child's lifetime.
        Ok(unsafe { WindowHandle::borrow_raw(self.0) })
    }
}

#[cfg(target_os = "linux")]
mod gtk_support {
    use crate::error::WebViewError;

    /// Initialize GTK once per process; WebKitGTK needs it on the UI thread.
    pub(super) fn ensure_init() -> Result<(), WebViewError> {
        if gtk::is_initialized() {
            return Ok(());
        }
        gtk::init().map_err(WebViewError::backend)
    }

    /// Drain pending GTK events without blocking the host's loop.
    pub(super) fn pump() {
        while gtk::events_pending() {
            gtk::main_iteration_do(false);
        }
    }
}
