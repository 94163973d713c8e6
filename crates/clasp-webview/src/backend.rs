//! Seam between [`WebView`](crate::WebView) and a native webview library.
//!
//! The `native` feature provides a `wry` implementation; tests plug in a
//! recorder. Backends live on the UI thread and need not be `Send`.

use clasp_core::NativeWindow;

use crate::error::WebViewError;
use crate::ipc::IpcInbox;

/// What the page shows first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Navigate to a URL.
    Url(String),
    /// Load an HTML document directly.
    Html(String),
}

/// Everything a backend needs to build a child view.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Host window the view is embedded into.
    pub parent: NativeWindow,
    /// Initial width in logical pixels.
    pub width: u32,
    /// Initial height in logical pixels.
    pub height: u32,
    /// Whether the child starts visible.
    pub visible: bool,
    /// Enable the web inspector.
    pub debug: bool,
    /// Script run at the start of every page load.
    pub init_script: String,
    /// Page to show once attached.
    pub source: Option<PageSource>,
    /// Destination for IPC bodies posted by the page.
    pub inbox: IpcInbox,
}

/// A live native child view.
pub trait Backend {
    /// Run `js` in the current page.
    fn evaluate_script(&self, js: &str) -> Result<(), WebViewError>;

    /// Navigate to `url`.
    fn load_url(&self, url: &str) -> Result<(), WebViewError>;

    /// Replace the page with `html`.
    fn load_html(&self, html: &str) -> Result<(), WebViewError>;

    /// Resize the child to fill `width` x `height` at the parent's origin.
    fn set_size(&self, width: u32, height: u32) -> Result<(), WebViewError>;

    /// Show or hide the child.
    fn set_visible(&self, visible: bool) -> Result<(), WebViewError>;

    /// Open the web inspector, if the backend has one.
    fn open_dev_tools(&self) {}

    /// Run pending toolkit events. Called on every [`WebView::pump`](crate::WebView::pump).
    fn poll(&self) {}
}

/// Builds backends when a parent window arrives.
pub trait BackendFactory {
    /// Whether this factory can build anything at all.
    fn is_available(&self) -> bool;

    /// Build a child view inside `config.parent`.
    fn attach(&self, config: BackendConfig) -> Result<Box<dyn Backend>, WebViewError>;
}

/// Factory used when no native backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableFactory;

impl BackendFactory for UnavailableFactory {
    fn is_available(&self) -> bool {
        false
    }

    fn attach(&self, _config: BackendConfig) -> Result<Box<dyn Backend>, WebViewError> {
        Err(WebViewError::Unavailable)
    }
}

/// The factory [`WebView::new`](crate::WebView::new) uses.
pub fn default_factory() -> Box<dyn BackendFactory> {
    #[cfg(feature = "native")]
    {
        Box::new(crate::native::WryFactory)
    }
    #[cfg(not(feature = "native"))]
    {
        Box::new(UnavailableFactory)
    }
}
