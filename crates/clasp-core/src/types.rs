//! Shared vocabulary types: window APIs, parent handles, webview options.

use serde::{Deserialize, Serialize};

/// Native windowing API a plugin GUI can be embedded into.
///
/// Mirrors the `CLAP_WINDOW_API_*` identifiers of the CLAP GUI extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowApi {
    /// No API negotiated yet.
    #[default]
    Unknown,
    /// macOS `NSView`.
    Cocoa,
    /// Windows `HWND`.
    Win32,
    /// X11 `Window` id.
    X11,
    /// Wayland surface. Recognized but never preferred or supported.
    Wayland,
}

impl WindowApi {
    /// CLAP window-api string (`"cocoa"`, `"win32"`, `"x11"`, `"wayland"`).
    ///
    /// Returns an empty string for [`WindowApi::Unknown`].
    pub fn as_clap_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Cocoa => "cocoa",
            Self::Win32 => "win32",
            Self::X11 => "x11",
            Self::Wayland => "wayland",
        }
    }

    /// Parse a CLAP window-api string. Unrecognized strings map to `Unknown`.
    pub fn from_clap_str(api: &str) -> Self {
        match api {
            "cocoa" => Self::Cocoa,
            "win32" => Self::Win32,
            "x11" => Self::X11,
            "wayland" => Self::Wayland,
            _ => Self::Unknown,
        }
    }

    /// The API embedded views use on the current platform.
    pub fn preferred() -> Self {
        if cfg!(target_os = "macos") {
            Self::Cocoa
        } else if cfg!(target_os = "windows") {
            Self::Win32
        } else {
            Self::X11
        }
    }

    /// Whether `api` can host an embedded view on the current platform.
    pub fn is_supported(api: Self) -> bool {
        api != Self::Unknown && api == Self::preferred()
    }
}

/// Host-provided parent window: an API tag plus an opaque handle.
///
/// The handle is an `NSView*`, `HWND` or X11 window id depending on `api`,
/// stored as an integer so the value is `Send` and comparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeWindow {
    /// Windowing API the handle belongs to.
    pub api: WindowApi,
    /// Raw handle value; `0` means "no window".
    pub handle: usize,
}

impl NativeWindow {
    /// Create a parent window descriptor.
    pub fn new(api: WindowApi, handle: usize) -> Self {
        Self { api, handle }
    }

    /// True when no handle is present.
    pub fn is_null(&self) -> bool {
        self.handle == 0
    }
}

/// Options applied when a webview is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebViewOptions {
    /// Enable the web inspector.
    pub enable_debug_mode: bool,
    /// Suppress the browser context menu (or route it to `clasp.onContextMenu`).
    pub disable_context_menu: bool,
    /// Install drag helpers that avoid pointer capture and its permission banner.
    pub enable_pointer_capture_fix: bool,
    /// Extra JavaScript appended to the bootstrap script.
    pub init_script: String,
}

impl Default for WebViewOptions {
    fn default() -> Self {
        Self {
            enable_debug_mode: false,
            disable_context_menu: true,
            enable_pointer_capture_fix: true,
            init_script: String::new(),
        }
    }
}

/// Fire-and-forget message sent from the page to native code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsMessage {
    /// Application-defined message type.
    pub kind: String,
    /// Payload as JSON text (`"null"` when the page sent none).
    pub payload: String,
}
