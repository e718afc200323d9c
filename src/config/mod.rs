//! Configuration loading.
//!
//! Settings are read once at startup and passed down read-only.

mod path;
mod settings;

pub use path::{DEFAULT_SETTINGS_PATH, SETTINGS_ENV, home_dir, resolve_path, settings_path};
pub use settings::{
    ConfigFormat, LogRotation, LogSettings, Settings, ToolSettings, load_settings,
    load_settings_from_str,
};
