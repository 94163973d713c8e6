//! Clasp Demo: stereo gain and pan with a webview GUI.
//!
//! Build: `cargo build -p clasp-plugin --example clasp-demo`
//! Output: `target/debug/examples/libclasp_demo.so` (rename to `.clap`)

clack_plugin::clack_export_entry!(
    clack_plugin::prelude::SinglePluginEntry<clasp_plugin::ClaspDemoPlugin>
);
