//! CLAP GUI extension glue for clasp webviews.
//!
//! [`GuiHelper`] adapts a [`clasp_webview::WebView`] to the CLAP `gui`
//! extension: API negotiation, sizing with limits and host scale, parenting
//! and visibility. The rest of the crate is a small demo plugin,
//! [`ClaspDemoPlugin`], that shows the full round trip.
//!
//! # Architecture
//!
//! ```text
//! Audio thread             Main thread                 Page
//! ────────────             ───────────                 ────
//! host param / note   ──►  Protocol queue  ── pump ──► clasp.on('param')
//! events                   on_main_thread              clasp.on('noteOn')
//! ParamValueEvent     ◄──  dirty mask      ◄── call ── clasp.invoke('setParam')
//! ```
//!
//! The audio thread never touches the webview. It queues updates on the
//! shared [`clasp_core::Protocol`] and asks the host for a main-thread
//! callback, where the queue is flushed into the page.
//!
//! # Building the demo
//!
//! ```text
//! cargo build -p clasp-plugin --example clasp-demo
//! ```
//!
//! The output `libclasp_demo.so` (or `.dll` / `.dylib`) is renamed to
//! `clasp-demo.clap`.

pub mod audio;
mod error;
pub mod gui;
pub mod logging;
pub mod main_thread;
pub mod params;
pub mod shared;

pub use audio::DemoAudioProcessor;
pub use error::GuiError;
pub use gui::{GuiHelper, native_window};
pub use logging::init_logging;
pub use main_thread::DemoMainThread;
pub use shared::DemoShared;

use clack_extensions::audio_ports::PluginAudioPorts;
use clack_extensions::gui::PluginGui;
use clack_extensions::note_ports::PluginNotePorts;
use clack_extensions::params::PluginParams;
use clack_extensions::state::PluginState;
use clack_plugin::prelude::*;

/// Name used for the demo's config file (`<config dir>/clasp/clasp-demo.toml`).
pub const PLUGIN_NAME: &str = "clasp-demo";

/// Demo plugin: stereo gain and pan with a webview GUI.
pub struct ClaspDemoPlugin;

impl Plugin for ClaspDemoPlugin {
    type AudioProcessor<'a> = DemoAudioProcessor<'a>;
    type Shared<'a> = DemoShared;
    type MainThread<'a> = DemoMainThread<'a>;

    fn declare_extensions(builder: &mut PluginExtensions<Self>, _shared: Option<&DemoShared>) {
        builder.register::<PluginAudioPorts>();
        builder.register::<PluginGui>();
        builder.register::<PluginNotePorts>();
        builder.register::<PluginParams>();
        builder.register::<PluginState>();
    }
}

impl DefaultPluginFactory for ClaspDemoPlugin {
    fn get_descriptor() -> PluginDescriptor {
        use clack_plugin::plugin::features::{AUDIO_EFFECT, STEREO, UTILITY};
        PluginDescriptor::new("com.clasp.demo", "Clasp Demo")
            .with_features([AUDIO_EFFECT, UTILITY, STEREO])
    }

    fn new_shared(host: HostSharedHandle<'_>) -> Result<DemoShared, PluginError> {
        init_logging();

        // SAFETY: the host outlives every plugin instance it creates. The
        // lifetime is extended to 'static so the handle can live in closures.
        #[allow(unsafe_code)]
        let host: HostSharedHandle<'static> = unsafe { core::mem::transmute(host) };

        tracing::info!("demo plugin instance created");

        let request_process: Box<dyn Fn() + Send + Sync> = Box::new(move || {
            host.request_process();
        });
        let request_callback: Box<dyn Fn() + Send + Sync> = Box::new(move || {
            host.request_callback();
        });

        Ok(DemoShared::new(Some(request_process), Some(request_callback)))
    }

    fn new_main_thread<'a>(
        _host: HostMainThreadHandle<'a>,
        shared: &'a DemoShared,
    ) -> Result<DemoMainThread<'a>, PluginError> {
        Ok(DemoMainThread::new(shared))
    }
}
