//! GUI configuration: window size limits, update rate, webview options.
//!
//! A config file looks like this (every key is optional):
//!
//! ```toml
//! update_rate_hz = 60
//!
//! [size]
//! width = 800
//! height = 600
//! min_width = 200
//! min_height = 150
//! max_width = 4096
//! max_height = 4096
//! resizable = true
//!
//! [webview]
//! enable_debug_mode = false
//! disable_context_menu = true
//! enable_pointer_capture_fix = true
//! init_script = ""
//! ```

use std::path::Path;

use clasp_core::WebViewOptions;
use clasp_core::throttle::MAX_UPDATE_RATE_HZ;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::gui_config_path;

/// Environment variable forcing webview debug mode (`1`, `true`, `yes`, `on`).
pub const DEVTOOLS_ENV: &str = "CLASP_DEVTOOLS";

/// Default GUI width in logical pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default GUI height in logical pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Default minimum width.
pub const DEFAULT_MIN_WIDTH: u32 = 200;
/// Default minimum height.
pub const DEFAULT_MIN_HEIGHT: u32 = 150;
/// Default maximum width and height.
pub const DEFAULT_MAX_EXTENT: u32 = 4096;
/// Default parameter update rate (~16 ms interval).
pub const DEFAULT_UPDATE_RATE_HZ: u32 = 60;

/// Window size and resize limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    /// Initial width.
    pub width: u32,
    /// Initial height.
    pub height: u32,
    /// Smallest width the host may resize to.
    pub min_width: u32,
    /// Smallest height the host may resize to.
    pub min_height: u32,
    /// Largest width the host may resize to.
    pub max_width: u32,
    /// Largest height the host may resize to.
    pub max_height: u32,
    /// Whether the host may resize the GUI at all.
    pub resizable: bool,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_width: DEFAULT_MAX_EXTENT,
            max_height: DEFAULT_MAX_EXTENT,
            resizable: true,
        }
    }
}

impl SizeConfig {
    /// Clamp a requested size into `[min, max]` per axis.
    pub fn clamp(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.clamp(self.min_width, self.max_width.max(self.min_width)),
            height.clamp(self.min_height, self.max_height.max(self.min_height)),
        )
    }
}

/// Complete GUI configuration for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Rate limit for single parameter updates sent to the page.
    pub update_rate_hz: u32,
    /// Window size and limits.
    pub size: SizeConfig,
    /// Webview behaviour.
    pub webview: WebViewOptions,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
            size: SizeConfig::default(),
            webview: WebViewOptions::default(),
        }
    }
}

impl GuiConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the config to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the user's config for `plugin`, falling back to defaults.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file is
    /// an error. The [`DEVTOOLS_ENV`] override is applied in both cases.
    pub fn load_for_plugin(plugin: &str) -> Result<Self, ConfigError> {
        Self::load_or_default(gui_config_path(plugin))
    }

    /// Like [`load_for_plugin`](Self::load_for_plugin) with an explicit path.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "loading GUI config");
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_devtools_flag(std::env::var(DEVTOOLS_ENV).ok().as_deref());
        config.validate()?;
        Ok(config)
    }

    /// Enable debug mode when `flag` is a truthy value of [`DEVTOOLS_ENV`].
    ///
    /// A missing or falsy flag leaves the configured value alone.
    pub fn apply_devtools_flag(&mut self, flag: Option<&str>) {
        let enabled = flag.is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        });
        if enabled {
            self.webview.enable_debug_mode = true;
        }
    }

    /// Check that sizes and rates are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.size;
        for (field, value) in [
            ("size.width", s.width),
            ("size.height", s.height),
            ("size.min_width", s.min_width),
            ("size.min_height", s.min_height),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be non-zero"));
            }
        }
        if s.min_width > s.max_width {
            return Err(ConfigError::invalid(
                "size.max_width",
                format!("{} is below min_width {}", s.max_width, s.min_width),
            ));
        }
        if s.min_height > s.max_height {
            return Err(ConfigError::invalid(
                "size.max_height",
                format!("{} is below min_height {}", s.max_height, s.min_height),
            ));
        }
        if !(s.min_width..=s.max_width).contains(&s.width) {
            return Err(ConfigError::invalid(
                "size.width",
                format!("{} is outside {}..={}", s.width, s.min_width, s.max_width),
            ));
        }
        if !(s.min_height..=s.max_height).contains(&s.height) {
            return Err(ConfigError::invalid(
                "size.height",
                format!("{} is outside {}..={}", s.height, s.min_height, s.max_height),
            ));
        }
        if !(1..=MAX_UPDATE_RATE_HZ).contains(&self.update_rate_hz) {
            return Err(ConfigError::invalid(
                "update_rate_hz",
                format!("{} is outside 1..={MAX_UPDATE_RATE_HZ}", self.update_rate_hz),
            ));
        }
        Ok(())
    }
}
