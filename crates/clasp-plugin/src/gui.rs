//! CLAP GUI extension adapter around a [`WebView`].
//!
//! [`GuiHelper`] holds the state a CLAP `gui` implementation needs (size,
//! limits, scale, visibility, negotiated window API) and forwards lifecycle
//! calls to the webview. The methods take plain Rust values so the logic can
//! be exercised without a host; `main_thread.rs` wires them to
//! `PluginGuiImpl`.
//!
//! # Sizing
//!
//! Sizes are stored in logical pixels. [`GuiHelper::get_size`] reports them
//! multiplied by the host scale, truncated. Requests are clamped to the
//! configured `[min, max]` range per axis.

use clasp_config::{GuiConfig, SizeConfig};
use clasp_core::{NativeWindow, WebViewOptions, WindowApi};
use clasp_webview::{BackendFactory, WebView, WebViewError};
use raw_window_handle::RawWindowHandle;

use crate::error::GuiError;

/// Webview-backed plugin GUI state.
pub struct GuiHelper {
    webview: WebView,
    limits: SizeConfig,
    width: u32,
    height: u32,
    scale: f64,
    visible: bool,
    api: WindowApi,
}

impl GuiHelper {
    /// Helper with default size limits around a native webview.
    pub fn new(options: WebViewOptions) -> Self {
        Self::with_webview(WebView::new(options))
    }

    /// Helper around an existing webview.
    pub fn with_webview(webview: WebView) -> Self {
        let limits = SizeConfig::default();
        Self {
            webview,
            width: limits.width,
            height: limits.height,
            limits,
            scale: 1.0,
            visible: false,
            api: WindowApi::Unknown,
        }
    }

    /// Helper configured from a GUI config file, using the native backend.
    pub fn from_config(config: &GuiConfig) -> Self {
        Self::with_webview(WebView::new(config.webview.clone())).configured(config)
    }

    /// Like [`from_config`](Self::from_config) with a custom webview backend.
    pub fn from_config_with_backend(config: &GuiConfig, factory: Box<dyn BackendFactory>) -> Self {
        Self::with_webview(WebView::with_backend(config.webview.clone(), factory))
            .configured(config)
    }

    fn configured(mut self, config: &GuiConfig) -> Self {
        self.limits = config.size;
        self.width = config.size.width;
        self.height = config.size.height;
        if !self.webview.set_update_rate_hz(config.update_rate_hz) {
            tracing::warn!(
                hz = config.update_rate_hz,
                "ignoring invalid update rate from config"
            );
        }
        self
    }

    // ── Configuration ───────────────────────────────────────────────────────

    /// Set the size reported before the host resizes the GUI.
    pub fn set_default_size(&mut self, width: u32, height: u32) {
        self.limits.width = width;
        self.limits.height = height;
        self.width = width;
        self.height = height;
    }

    /// Smallest size the host may request.
    pub fn set_min_size(&mut self, width: u32, height: u32) {
        self.limits.min_width = width;
        self.limits.min_height = height;
    }

    /// Largest size the host may request.
    pub fn set_max_size(&mut self, width: u32, height: u32) {
        self.limits.max_width = width;
        self.limits.max_height = height;
    }

    /// Allow or forbid host-driven resizing.
    pub fn set_resizable(&mut self, resizable: bool) {
        self.limits.resizable = resizable;
    }

    /// The wrapped webview.
    pub fn webview(&self) -> &WebView {
        &self.webview
    }

    /// The wrapped webview, mutably.
    pub fn webview_mut(&mut self) -> &mut WebView {
        &mut self.webview
    }

    /// Current logical size.
    pub fn logical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Host scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether the host last asked for the GUI to be shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    // ── CLAP GUI Calls ──────────────────────────────────────────────────────

    /// Embedded (non-floating) views on the platform API only.
    pub fn is_api_supported(&self, api: WindowApi, floating: bool) -> bool {
        !floating && WebView::is_api_supported(api)
    }

    /// Platform API, embedded.
    pub fn get_preferred_api(&self) -> (WindowApi, bool) {
        (WebView::preferred_api(), false)
    }

    /// Check `api` and prepare the webview.
    pub fn create(&mut self, api: WindowApi, floating: bool) -> Result<(), GuiError> {
        if !self.is_api_supported(api, floating) {
            return Err(GuiError::UnsupportedApi { api, floating });
        }
        self.webview.create()?;
        self.api = api;
        tracing::info!(api = api.as_clap_str(), "GUI created");
        Ok(())
    }

    /// Tear the view down. The helper can be created again afterwards.
    pub fn destroy(&mut self) {
        self.webview.destroy();
        self.visible = false;
        self.api = WindowApi::Unknown;
        tracing::info!("GUI destroyed");
    }

    /// Store the host's scale factor.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), GuiError> {
        self.scale = scale;
        Ok(())
    }

    /// Current size in physical pixels.
    pub fn get_size(&self) -> (u32, u32) {
        (
            (f64::from(self.width) * self.scale) as u32,
            (f64::from(self.height) * self.scale) as u32,
        )
    }

    /// Whether the host may resize the GUI.
    pub fn can_resize(&self) -> bool {
        self.limits.resizable
    }

    /// Per-axis resizability; aspect ratio is never preserved.
    pub fn resize_hints(&self) -> (bool, bool) {
        (self.limits.resizable, self.limits.resizable)
    }

    /// Nearest acceptable size to the requested one.
    pub fn adjust_size(&self, width: u32, height: u32) -> (u32, u32) {
        self.limits.clamp(width, height)
    }

    /// Record and apply a new size.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), GuiError> {
        self.width = width;
        self.height = height;
        self.webview.set_size(width, height)?;
        Ok(())
    }

    /// Embed into the host window and apply the current size.
    pub fn set_parent(&mut self, window: NativeWindow) -> Result<(), GuiError> {
        if self.api != WindowApi::Unknown && window.api != self.api {
            return Err(GuiError::ApiMismatch {
                expected: self.api,
                actual: window.api,
            });
        }
        self.webview.set_parent(window)?;
        self.webview.set_size(self.width, self.height)?;
        Ok(())
    }

    /// Embed into a host window given as a `raw-window-handle` value.
    pub fn set_parent_raw(&mut self, handle: RawWindowHandle) -> Result<(), GuiError> {
        let window = native_window(handle).ok_or(GuiError::UnknownHandle)?;
        self.set_parent(window)
    }

    /// Floating windows are unsupported.
    pub fn set_transient(&mut self, _window: NativeWindow) -> Result<(), GuiError> {
        Err(GuiError::TransientUnsupported)
    }

    /// Window titles only apply to floating windows.
    pub fn suggest_title(&mut self, _title: &str) {}

    /// Show the view. Fails before `create` and after `destroy`.
    pub fn show(&mut self) -> Result<(), GuiError> {
        if !self.webview.show() {
            return Err(WebViewError::NotCreated.into());
        }
        self.visible = true;
        Ok(())
    }

    /// Hide the view. Fails before `create` and after `destroy`.
    pub fn hide(&mut self) -> Result<(), GuiError> {
        if !self.webview.hide() {
            return Err(WebViewError::NotCreated.into());
        }
        self.visible = false;
        Ok(())
    }
}

impl std::fmt::Debug for GuiHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiHelper")
            .field("api", &self.api)
            .field("size", &(self.width, self.height))
            .field("scale", &self.scale)
            .field("visible", &self.visible)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// Translate a host window handle into a [`NativeWindow`].
///
/// Returns `None` for handle kinds CLAP never hands out.
pub fn native_window(handle: RawWindowHandle) -> Option<NativeWindow> {
    let (api, raw) = match handle {
        RawWindowHandle::AppKit(h) => (WindowApi::Cocoa, h.ns_view as usize),
        RawWindowHandle::Win32(h) => (WindowApi::Win32, h.hwnd as usize),
        RawWindowHandle::Xlib(h) => (WindowApi::X11, h.window as usize),
        RawWindowHandle::Xcb(h) => (WindowApi::X11, h.window as usize),
        RawWindowHandle::Wayland(h) => (WindowApi::Wayland, h.surface as usize),
        _ => return None,
    };
    Some(NativeWindow::new(api, raw))
}
