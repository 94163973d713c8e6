//! Main-thread side of the demo plugin.
//!
//! Owns the [`GuiHelper`] (and with it the webview), answers parameter and
//! state queries, and delivers queued updates to the page whenever the host
//! runs `on_main_thread`.

use std::io::{Read, Write};

use clack_extensions::audio_ports::{
    AudioPortFlags, AudioPortInfo, AudioPortInfoWriter, AudioPortType, PluginAudioPortsImpl,
};
use clack_extensions::gui::{
    AspectRatioStrategy, GuiApiType, GuiConfiguration, GuiResizeHints, GuiSize, PluginGuiImpl,
    Window,
};
use clack_extensions::note_ports::{
    NoteDialect, NotePortInfo, NotePortInfoWriter, PluginNotePortsImpl,
};
use clack_extensions::params::{
    ParamDisplayWriter, ParamInfo, ParamInfoFlags, ParamInfoWriter, PluginMainThreadParams,
};
use clack_extensions::state::PluginStateImpl;
use clack_plugin::prelude::*;
use clack_plugin::stream::{InputStream, OutputStream};
use clack_plugin::utils::Cookie;
use clasp_config::GuiConfig;
use clasp_core::{WindowApi, json_f32};

use crate::PLUGIN_NAME;
use crate::audio::push_gui_changes;
use crate::gui::GuiHelper;
use crate::params::{PARAM_COUNT, PARAMS, param_info};
use crate::shared::DemoShared;

/// Page shown in the webview.
const UI_HTML: &str = include_str!("../ui/index.html");

/// Main-thread state of the demo plugin.
pub struct DemoMainThread<'a> {
    shared: &'a DemoShared,
    gui: GuiHelper,
}

impl<'a> DemoMainThread<'a> {
    /// Build the GUI from the user's config file (or defaults) and connect
    /// it to the shared protocol.
    pub fn new(shared: &'a DemoShared) -> Self {
        let config = GuiConfig::load_for_plugin(PLUGIN_NAME).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default GUI config");
            GuiConfig::default()
        });
        Self::with_gui(shared, GuiHelper::from_config(&config), &config)
    }

    /// Connect an existing GUI helper.
    pub fn with_gui(shared: &'a DemoShared, mut gui: GuiHelper, config: &GuiConfig) -> Self {
        let protocol = shared.protocol();
        if !protocol.set_update_rate_hz(config.update_rate_hz) {
            tracing::warn!(hz = config.update_rate_hz, "ignoring invalid update rate");
        }
        protocol.attach(gui.webview_mut());

        let webview = gui.webview_mut();
        if let Err(e) = webview.load_html(UI_HTML) {
            tracing::warn!(error = %e, "failed to load GUI page");
        }
        let waker = shared.clone();
        webview.set_wake(move || waker.request_callback());
        let ready = shared.clone();
        webview.set_ready_callback(move || ready.notify_all_params());

        Self { shared, gui }
    }

    /// The GUI helper.
    pub fn gui(&self) -> &GuiHelper {
        &self.gui
    }

    /// The GUI helper, mutably.
    pub fn gui_mut(&mut self) -> &mut GuiHelper {
        &mut self.gui
    }

    /// Deliver page calls and queued updates.
    fn pump_gui(&mut self) {
        let webview = self.gui.webview();
        webview.pump();
        self.shared.protocol().process_queue(webview);
    }
}

impl<'a> PluginMainThread<'a, DemoShared> for DemoMainThread<'a> {
    fn on_main_thread(&mut self) {
        self.pump_gui();
    }
}

// ── Parameter Extension ─────────────────────────────────────────────────────

impl PluginMainThreadParams for DemoMainThread<'_> {
    fn count(&mut self) -> u32 {
        PARAM_COUNT as u32
    }

    fn get_info(&mut self, param_index: u32, info: &mut ParamInfoWriter) {
        let Some(p) = param_info(param_index) else {
            return;
        };
        info.set(&ParamInfo {
            id: ClapId::new(p.id),
            name: p.name.as_bytes(),
            module: p.module.as_bytes(),
            min_value: f64::from(p.min),
            max_value: f64::from(p.max),
            default_value: f64::from(p.default),
            flags: ParamInfoFlags::IS_AUTOMATABLE,
            cookie: Cookie::default(),
        });
    }

    fn get_value(&mut self, param_id: ClapId) -> Option<f64> {
        self.shared.params().get(param_id.get()).map(f64::from)
    }

    fn value_to_text(
        &mut self,
        param_id: ClapId,
        value: f64,
        writer: &mut ParamDisplayWriter,
    ) -> core::fmt::Result {
        use core::fmt::Write as _;

        match param_info(param_id.get()) {
            Some(p) => write!(writer, "{}", p.format(value as f32)),
            None => write!(writer, "{value:.2}"),
        }
    }

    fn text_to_value(&mut self, param_id: ClapId, text: &core::ffi::CStr) -> Option<f64> {
        let p = param_info(param_id.get())?;
        p.parse(text.to_str().ok()?).map(f64::from)
    }

    fn flush(&mut self, input: &InputEvents, output: &mut OutputEvents) {
        for event in input {
            if let Some(clack_plugin::events::spaces::CoreEventSpace::ParamValue(ev)) =
                event.as_core_event()
                && let Some(param_id) = ev.param_id()
                && let Some(value) = self.shared.params().set(param_id.get(), ev.value() as f32)
            {
                self.shared.protocol().queue_param_change(param_id.get(), value);
            }
        }
        push_gui_changes(self.shared, output);
        self.pump_gui();
    }
}

// ── State Extension ─────────────────────────────────────────────────────────

impl PluginStateImpl for DemoMainThread<'_> {
    fn save(&mut self, output: &mut OutputStream) -> Result<(), PluginError> {
        let mut state = serde_json::Map::new();
        for (id, value) in self.shared.params().snapshot() {
            state.insert(id.to_string(), json_f32(value));
        }

        let json = serde_json::to_vec(&state)
            .map_err(|_| PluginError::Message("Failed to serialize state"))?;
        output
            .write_all(&json)
            .map_err(|_| PluginError::Message("Failed to write state"))?;
        Ok(())
    }

    fn load(&mut self, input: &mut InputStream) -> Result<(), PluginError> {
        let mut buf = Vec::new();
        input
            .read_to_end(&mut buf)
            .map_err(|_| PluginError::Message("Failed to read state"))?;

        let state: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&buf)
            .map_err(|_| PluginError::Message("Invalid state JSON"))?;

        for p in &PARAMS {
            if let Some(value) = state.get(&p.id.to_string()).and_then(|v| v.as_f64()) {
                self.shared.params().set(p.id, value as f32);
            }
        }
        tracing::info!(params = state.len(), "state loaded");
        self.shared.notify_all_params();
        Ok(())
    }
}

// ── Audio and Note Ports Extensions ─────────────────────────────────────────

impl PluginAudioPortsImpl for DemoMainThread<'_> {
    fn count(&mut self, _is_input: bool) -> u32 {
        1
    }

    fn get(&mut self, index: u32, _is_input: bool, writer: &mut AudioPortInfoWriter) {
        if index == 0 {
            writer.set(&AudioPortInfo {
                id: ClapId::new(0),
                name: b"Main",
                channel_count: 2,
                flags: AudioPortFlags::IS_MAIN,
                port_type: Some(AudioPortType::STEREO),
                in_place_pair: None,
            });
        }
    }
}

impl PluginNotePortsImpl for DemoMainThread<'_> {
    fn count(&mut self, is_input: bool) -> u32 {
        u32::from(is_input)
    }

    fn get(&mut self, index: u32, is_input: bool, writer: &mut NotePortInfoWriter) {
        if is_input && index == 0 {
            writer.set(&NotePortInfo {
                id: ClapId::new(0),
                name: b"Notes",
                preferred_dialect: Some(NoteDialect::Clap),
                supported_dialects: NoteDialect::Clap.into(),
            });
        }
    }
}

// ── GUI Extension ───────────────────────────────────────────────────────────

/// The window API the host named. Support is decided by [`GuiHelper`].
fn window_api(api_type: GuiApiType) -> WindowApi {
    if api_type == GuiApiType::COCOA {
        WindowApi::Cocoa
    } else if api_type == GuiApiType::WIN32 {
        WindowApi::Win32
    } else if api_type == GuiApiType::X11 {
        WindowApi::X11
    } else if api_type == GuiApiType::WAYLAND {
        WindowApi::Wayland
    } else {
        WindowApi::Unknown
    }
}

impl PluginGuiImpl for DemoMainThread<'_> {
    fn is_api_supported(&mut self, config: GuiConfiguration) -> bool {
        self.gui
            .is_api_supported(window_api(config.api_type), config.is_floating)
    }

    fn get_preferred_api(&mut self) -> Option<GuiConfiguration<'_>> {
        let (_, is_floating) = self.gui.get_preferred_api();
        Some(GuiConfiguration {
            api_type: GuiApiType::default_for_current_platform()?,
            is_floating,
        })
    }

    fn create(&mut self, config: GuiConfiguration) -> Result<(), PluginError> {
        self.gui
            .create(window_api(config.api_type), config.is_floating)
            .map_err(Into::into)
    }

    fn destroy(&mut self) {
        self.gui.destroy();
    }

    fn set_scale(&mut self, scale: f64) -> Result<(), PluginError> {
        self.gui.set_scale(scale).map_err(Into::into)
    }

    fn get_size(&mut self) -> Option<GuiSize> {
        let (width, height) = self.gui.get_size();
        Some(GuiSize { width, height })
    }

    fn can_resize(&mut self) -> bool {
        self.gui.can_resize()
    }

    fn get_resize_hints(&mut self) -> Option<GuiResizeHints> {
        let (can_resize_horizontally, can_resize_vertically) = self.gui.resize_hints();
        Some(GuiResizeHints {
            can_resize_horizontally,
            can_resize_vertically,
            strategy: AspectRatioStrategy::Disregard,
        })
    }

    fn adjust_size(&mut self, size: GuiSize) -> Option<GuiSize> {
        let (width, height) = self.gui.adjust_size(size.width, size.height);
        Some(GuiSize { width, height })
    }

    fn set_size(&mut self, size: GuiSize) -> Result<(), PluginError> {
        self.gui
            .set_size(size.width, size.height)
            .map_err(Into::into)
    }

    fn set_parent(&mut self, window: Window) -> Result<(), PluginError> {
        use raw_window_handle::HasRawWindowHandle;
        self.gui
            .set_parent_raw(window.raw_window_handle())
            .map_err(Into::into)
    }

    fn set_transient(&mut self, window: Window) -> Result<(), PluginError> {
        use raw_window_handle::HasRawWindowHandle;
        let parent = crate::gui::native_window(window.raw_window_handle()).unwrap_or_default();
        self.gui.set_transient(parent).map_err(Into::into)
    }

    fn show(&mut self) -> Result<(), PluginError> {
        self.gui.show().map_err(Into::into)
    }

    fn hide(&mut self) -> Result<(), PluginError> {
        self.gui.hide().map_err(Into::into)
    }
}
