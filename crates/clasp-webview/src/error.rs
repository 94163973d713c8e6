//! Error types for webview operations.

use clasp_core::WindowApi;
use thiserror::Error;

/// Errors reported by [`WebView`](crate::WebView) lifecycle calls.
#[derive(Debug, Error)]
pub enum WebViewError {
    /// `create()` has not been called, or `destroy()` has.
    #[error("webview not created")]
    NotCreated,

    /// No native webview backend is compiled in.
    #[error("no native webview backend available")]
    Unavailable,

    /// The host passed a null parent window.
    #[error("parent window handle is null")]
    NullParent,

    /// The parent window belongs to an API this platform cannot embed into.
    #[error("unsupported window api: {}", .0.as_clap_str())]
    UnsupportedApi(WindowApi),

    /// The native webview library reported a failure.
    #[error("webview backend error: {0}")]
    Backend(String),
}

impl WebViewError {
    /// Wrap a backend failure.
    pub fn backend(e: impl std::fmt::Display) -> Self {
        WebViewError::Backend(e.to_string())
    }
}
