//! Keyboard re-routing for Windows hosts.
//!
//! Some hosts never deliver key events to an embedded WebView2. The
//! workaround briefly focuses the host's parent window, replays the key with
//! `SendInput`, and puts focus back.

#![allow(unsafe_code)]

use std::mem::size_of;

use windows_sys::Win32::Foundation::HWND;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    GetFocus, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_SCANCODE, MAPVK_VK_TO_VSC, MapVirtualKeyW, SendInput, SetFocus, VIRTUAL_KEY,
    VK_CONTROL, VK_SHIFT, VkKeyScanW,
};

/// Replays key presses on the host's parent window.
#[derive(Debug, Clone, Copy)]
pub struct KeypressWorkaround {
    webview: usize,
    parent: usize,
    enabled: bool,
}

impl KeypressWorkaround {
    /// Route keys from `webview` (may be 0) to `parent`.
    pub fn new(webview: usize, parent: usize) -> Self {
        Self {
            webview,
            parent,
            enabled: true,
        }
    }

    /// Enable or disable re-routing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether re-routing is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Child window the keys were meant for.
    pub fn webview(&self) -> usize {
        self.webview
    }

    /// Re-send a key press. Returns whether the key was re-routed.
    pub fn on_key_down(&self, key_code: u16) -> bool {
        self.reroute(key_code, false)
    }

    /// Re-send a key release. Returns whether the key was re-routed.
    pub fn on_key_up(&self, key_code: u16) -> bool {
        self.reroute(key_code, true)
    }

    fn reroute(&self, key_code: u16, key_up: bool) -> bool {
        if !self.enabled || self.parent == 0 {
            return false;
        }
        // SAFETY: focus calls accept any HWND value; invalid ones fail harmlessly.
        unsafe {
            let previous = GetFocus();
            SetFocus(self.parent as HWND);
            send_scan_code(key_code, key_up);
            SetFocus(previous);
        }
        true
    }
}

fn send_scan_code(key_code: u16, key_up: bool) {
    // SAFETY: plain value-in, value-out Win32 calls.
    let scan = unsafe {
        let vk = (VkKeyScanW(key_code) as u16) & 0xff;
        MapVirtualKeyW(u32::from(vk), MAPVK_VK_TO_VSC)
    };
    let mut flags = KEYEVENTF_SCANCODE;
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    send(&[key_input(0, scan as u16, flags)]);
}

/// Ctrl+Shift+I down, then up in reverse order.
pub(crate) fn send_dev_tools_chord() {
    const VK_I: VIRTUAL_KEY = b'I' as VIRTUAL_KEY;
    send(&[
        key_input(VK_CONTROL, 0, 0),
        key_input(VK_SHIFT, 0, 0),
        key_input(VK_I, 0, 0),
        key_input(VK_I, 0, KEYEVENTF_KEYUP),
        key_input(VK_SHIFT, 0, KEYEVENTF_KEYUP),
        key_input(VK_CONTROL, 0, KEYEVENTF_KEYUP),
    ]);
}

fn key_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) {
    // SAFETY: `inputs` is a valid slice of initialized INPUT structs.
    let sent = unsafe { SendInput(inputs.len() as u32, inputs.as_ptr(), size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        tracing::debug!(sent, expected = inputs.len(), "SendInput was partially blocked");
    }
}
