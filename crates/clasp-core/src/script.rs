//! Script injection seam between the protocol and a webview.
//!
//! [`ScriptSink`] is the only thing `Protocol` needs to talk to the page, and
//! [`ScriptHost`] is what it needs to install itself. `clasp-webview`
//! implements both; tests implement them with a recorder.

use crate::types::WebViewOptions;

/// Default `window.clasp` API installed in every page.
pub const BOOTSTRAP_JS: &str = include_str!("../assets/bootstrap.js");

/// Context menu suppression.
pub const CONTEXT_MENU_FIX_JS: &str = include_str!("../assets/context_menu.js");

/// Drag helpers that avoid pointer capture.
pub const POINTER_CAPTURE_FIX_JS: &str = include_str!("../assets/pointer_capture.js");

/// Page-side companion of `Protocol` (`__clasp_recv`, `clasp.invoke`, ...).
pub const CLASP_JS: &str = include_str!("../assets/clasp.js");

/// Native callback bound to a page function.
///
/// Receives the call's arguments as a JSON array and a sink for pushing
/// script back to the page; returns the call's result as JSON text (or
/// plain text, or empty for `undefined`).
pub type BindingCallback = Box<dyn Fn(&str, &dyn ScriptSink) -> String + Send + Sync>;

/// Something that can run JavaScript in the page.
pub trait ScriptSink {
    /// Evaluate `js` without waiting for a result.
    fn evaluate_script(&self, js: &str);
}

/// Something that can expose native functions and startup scripts to the page.
pub trait ScriptHost: ScriptSink {
    /// Make `callback` callable from the page as `window.<name>(...)`.
    fn bind(&mut self, name: &str, callback: BindingCallback);

    /// Run `js` in every page load, after the bootstrap script.
    fn add_init_script(&mut self, js: &str);
}

/// Assemble the bootstrap script for `options`.
///
/// Order: default API, context-menu fix, pointer-capture fix, then the
/// user's own `init_script`.
pub fn bootstrap_script(options: &WebViewOptions) -> String {
    let mut script = String::with_capacity(
        BOOTSTRAP_JS.len()
            + CONTEXT_MENU_FIX_JS.len()
            + POINTER_CAPTURE_FIX_JS.len()
            + options.init_script.len()
            + 4,
    );
    script.push_str(BOOTSTRAP_JS);

    if options.disable_context_menu {
        script.push('\n');
        script.push_str(CONTEXT_MENU_FIX_JS);
    }
    if options.enable_pointer_capture_fix {
        script.push('\n');
        script.push_str(POINTER_CAPTURE_FIX_JS);
    }
    if !options.init_script.is_empty() {
        script.push('\n');
        script.push_str(&options.init_script);
    }
    script
}

/// Call a guarded `window.clasp.<hook>(args)` if the page defines it.
pub fn hook_call(hook: &str, args: &str) -> String {
    format!("if (window.clasp && window.clasp.{hook}) {{ window.clasp.{hook}({args}); }}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bootstrap_includes_both_fixes() {
        let script = bootstrap_script(&WebViewOptions::default());
        assert!(script.starts_with(BOOTSTRAP_JS));
        assert!(script.contains("contextmenu"));
        assert!(script.contains("startDrag"));
    }

    #[test]
    fn fixes_can_be_disabled() {
        let opts = WebViewOptions {
            disable_context_menu: false,
            enable_pointer_capture_fix: false,
            ..WebViewOptions::default()
        };
        let script = bootstrap_script(&opts);
        assert!(!script.contains("contextmenu"));
        assert!(!script.contains("startDrag"));
    }

    #[test]
    fn user_script_comes_last() {
        let opts = WebViewOptions {
            init_script: "window.userInit = 1;".into(),
            ..WebViewOptions::default()
        };
        assert!(bootstrap_script(&opts).ends_with("window.userInit = 1;"));
    }

    #[test]
    fn hook_call_is_guarded() {
        assert_eq!(
            hook_call("onNoteOff", "0, 60"),
            "if (window.clasp && window.clasp.onNoteOff) { window.clasp.onNoteOff(0, 60); }"
        );
    }
}
