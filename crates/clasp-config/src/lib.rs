//! Configuration for clasp plugin GUIs.
//!
//! Each plugin may ship (or the user may drop) a TOML file describing the
//! GUI's initial size, resize limits, parameter update rate and webview
//! options. Missing keys fall back to the built-in defaults.
//!
//! # Example
//!
//! ```rust,no_run
//! use clasp_config::{GuiConfig, paths};
//!
//! // Defaults, the user's file, then the CLASP_DEVTOOLS override.
//! let config = GuiConfig::load_for_plugin("clasp-demo").unwrap();
//! println!("{}x{}", config.size.width, config.size.height);
//!
//! // Write the current config back.
//! config.save(paths::gui_config_path("clasp-demo")).unwrap();
//! ```

mod error;
mod gui;

/// Platform-specific paths for configuration files.
pub mod paths;

pub use error::ConfigError;
pub use gui::{
    DEFAULT_HEIGHT, DEFAULT_MAX_EXTENT, DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH,
    DEFAULT_UPDATE_RATE_HZ, DEFAULT_WIDTH, DEVTOOLS_ENV, GuiConfig, SizeConfig,
};
pub use paths::{gui_config_path, user_config_dir};
