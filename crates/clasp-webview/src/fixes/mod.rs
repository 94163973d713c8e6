//! Host-specific workarounds.

#[cfg(windows)]
pub mod keypress_win;
