//! Daemon settings, loaded once at startup.
//!
//! Three formats are accepted, chosen by file extension:
//!
//! ```toml
//! # settings.toml
//! destination_dir = "/rips"
//!
//! [tools]
//! makemkvcon = "/usr/bin/makemkvcon"
//!
//! [logging]
//! rotation = "daily"
//! ```
//!
//! the same structure as YAML (`.yaml`/`.yml`), and the flat legacy
//! `key=value` file used by older container images:
//!
//! ```text
//! app_DestinationDir="/rips"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use super::path::resolve_path;
use crate::error::{Result, RipError};

/// Legacy key holding the destination directory.
const LEGACY_DESTINATION_KEY: &str = "app_DestinationDir";

/// Settings file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (.toml).
    Toml,
    /// YAML format (.yaml, .yml).
    Yaml,
    /// Flat `key=value` lines, any other extension.
    Legacy,
}

impl ConfigFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("toml") => Self::Toml,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Legacy,
        }
    }
}

/// External program locations and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Status-query and video ripping tool.
    pub makemkvcon: String,
    /// Audio ripping tool.
    pub whipper: String,
    /// Media eject program.
    pub eject: String,
    /// Arguments requesting cached disc info for all drives.
    pub status_args: Vec<String>,
    /// whipper configuration file; defaults to `$XDG_CONFIG_HOME/whipper/whipper.conf`.
    pub whipper_config: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            makemkvcon: "makemkvcon".to_string(),
            whipper: "whipper".to_string(),
            eject: "eject".to_string(),
            status_args: ["-r", "--cache=1", "info", "disc:"]
                .into_iter()
                .map(String::from)
                .collect(),
            whipper_config: None,
        }
    }
}

/// Log file rotation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// File sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    pub file_name: String,
    /// Directory for the log file; the destination directory when unset.
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file_name: "ripper.log".to_string(),
            directory: None,
            rotation: LogRotation::Never,
        }
    }
}

/// Complete daemon settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Root of all ripped output; each media category gets a sub-directory.
    pub destination_dir: PathBuf,
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    #[must_use]
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            tools: ToolSettings::default(),
            logging: LogSettings::default(),
        }
    }

    /// Directory the file sink writes into.
    #[must_use]
    pub fn log_directory(&self) -> &Path {
        self.logging
            .directory
            .as_deref()
            .unwrap_or(self.destination_dir.as_path())
    }

    /// Validate required values.
    pub fn validate(&self) -> Result<()> {
        if self.destination_dir.as_os_str().is_empty() {
            return Err(RipError::ConfigInvalid(
                "destination_dir must not be empty".to_string(),
            ));
        }
        if self.tools.makemkvcon.trim().is_empty() {
            return Err(RipError::ConfigInvalid(
                "tools.makemkvcon must not be empty".to_string(),
            ));
        }
        if self.logging.file_name.trim().is_empty() {
            return Err(RipError::ConfigInvalid(
                "logging.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `~` and relative paths against `config_dir`.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<()> {
        self.destination_dir = resolve_path(&self.destination_dir, config_dir)?;
        if let Some(dir) = self.logging.directory.take() {
            self.logging.directory = Some(resolve_path(&dir, config_dir)?);
        }
        if let Some(conf) = self.tools.whipper_config.take() {
            self.tools.whipper_config = Some(resolve_path(&conf, config_dir)?);
        }
        Ok(())
    }
}

/// Load settings from a file, detecting its format from the extension.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let format = ConfigFormat::from_extension(path);
    debug!(?format, "Loading settings");

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RipError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            RipError::Io(e)
        }
    })?;

    let mut settings = load_settings_from_str(&content, format)?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    settings.resolve_paths(config_dir)?;

    info!(
        destination = %settings.destination_dir.display(),
        "Settings loaded"
    );
    Ok(settings)
}

/// Parse settings content in a known format.
pub fn load_settings_from_str(content: &str, format: ConfigFormat) -> Result<Settings> {
    let settings: Settings = match format {
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| RipError::ConfigParse(format!("TOML: {e}")))?
        }
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| RipError::ConfigParse(format!("YAML: {e}")))?,
        ConfigFormat::Legacy => parse_legacy(content)?,
    };
    settings.validate()?;
    Ok(settings)
}

/// Parse section-less `key=value` settings.
fn parse_legacy(content: &str) -> Result<Settings> {
    let mut destination = None;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(['#', ';', '[']) {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(RipError::ConfigParse(format!(
                "line {}: expected key=value",
                lineno + 1
            )));
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        if key.eq_ignore_ascii_case(LEGACY_DESTINATION_KEY) {
            destination = Some(PathBuf::from(value));
        } else {
            trace!(key, "Ignoring legacy setting");
        }
    }

    let destination = destination.ok_or_else(|| {
        RipError::ConfigInvalid(format!("missing {LEGACY_DESTINATION_KEY}"))
    })?;
    Ok(Settings::new(destination))
}
