//! Platform helpers: parent handle translation and keyboard shims.

use std::ffi::c_void;
use std::num::NonZeroIsize;
use std::ptr::NonNull;

use clasp_core::{NativeWindow, WindowApi};
use raw_window_handle::{
    AppKitWindowHandle, RawWindowHandle, Win32WindowHandle, XlibWindowHandle,
};

use crate::error::WebViewError;

/// True on macOS.
pub const fn is_macos() -> bool {
    cfg!(target_os = "macos")
}

/// True on Windows.
pub const fn is_windows() -> bool {
    cfg!(target_os = "windows")
}

/// True on anything that is neither macOS nor Windows.
pub const fn is_linux() -> bool {
    !is_macos() && !is_windows()
}

/// Translate a host parent handle into a `raw-window-handle` parent.
///
/// Wayland has no child-window embedding and is rejected, as is a handle
/// whose API was never negotiated.
pub fn parent_window_handle(window: NativeWindow) -> Result<RawWindowHandle, WebViewError> {
    if window.is_null() {
        return Err(WebViewError::NullParent);
    }
    match window.api {
        WindowApi::Win32 => {
            let hwnd = NonZeroIsize::new(window.handle as isize).ok_or(WebViewError::NullParent)?;
            Ok(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
        }
        WindowApi::Cocoa => {
            let view = NonNull::new(window.handle as *mut c_void).ok_or(WebViewError::NullParent)?;
            Ok(RawWindowHandle::AppKit(AppKitWindowHandle::new(view)))
        }
        WindowApi::X11 => Ok(RawWindowHandle::Xlib(XlibWindowHandle::new(
            window.handle as _,
        ))),
        api @ (WindowApi::Wayland | WindowApi::Unknown) => Err(WebViewError::UnsupportedApi(api)),
    }
}

/// Press and release Ctrl+Shift+I, the inspector shortcut of WebView2.
///
/// Only Windows needs it; elsewhere this does nothing.
pub fn simulate_dev_tools_shortcut() {
    #[cfg(windows)]
    crate::fixes::keypress_win::send_dev_tools_chord();
}
