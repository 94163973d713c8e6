//! Errors raised while driving the GUI extension.

use clack_plugin::prelude::PluginError;
use clasp_core::WindowApi;
use clasp_webview::WebViewError;
use thiserror::Error;

/// Failure of a CLAP GUI call.
#[derive(Debug, Error)]
pub enum GuiError {
    /// The host asked for a windowing API or floating mode we cannot embed into.
    #[error("unsupported window api {api:?} (floating: {floating})")]
    UnsupportedApi {
        /// Requested API.
        api: WindowApi,
        /// Whether a floating window was requested.
        floating: bool,
    },

    /// The parent window belongs to a different API than the one negotiated in `create`.
    #[error("parent window is {actual:?}, GUI was created for {expected:?}")]
    ApiMismatch {
        /// API passed to `create`.
        expected: WindowApi,
        /// API of the window passed to `set_parent`.
        actual: WindowApi,
    },

    /// The host handle is of a kind we do not know how to embed into.
    #[error("unrecognized parent window handle")]
    UnknownHandle,

    /// Floating windows are not supported, so there is nothing to be transient for.
    #[error("transient windows are not supported")]
    TransientUnsupported,

    /// Webview failure.
    #[error(transparent)]
    WebView(#[from] WebViewError),
}

impl GuiError {
    /// Static description handed to the host.
    pub fn message(&self) -> &'static str {
        match self {
            GuiError::UnsupportedApi { .. } => "unsupported GUI api",
            GuiError::ApiMismatch { .. } => "parent window api mismatch",
            GuiError::UnknownHandle => "unrecognized parent window handle",
            GuiError::TransientUnsupported => "transient windows are not supported",
            GuiError::WebView(WebViewError::Unavailable) => "no webview backend available",
            GuiError::WebView(_) => "webview error",
        }
    }
}

impl From<GuiError> for PluginError {
    fn from(e: GuiError) -> Self {
        tracing::warn!(error = %e, "GUI request failed");
        PluginError::Message(e.message())
    }
}
