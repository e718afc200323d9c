//! Error types for drive watching and ripping.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for autoripper operations.
#[derive(Error, Debug)]
pub enum RipError {
    // Drive errors
    #[error("No optical drives found")]
    NoDrivesFound,

    #[error("Could not identify drive '{device}': {reason}")]
    DriveIdentity { device: String, reason: String },

    // Status tool errors
    #[error("Drive status query via '{tool}' failed: {reason}")]
    StatusQuery { tool: String, reason: String },

    #[error("Unparseable drive status output: {0}")]
    StatusParse(String),

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // Dispatch errors
    #[error("Unable to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{tool}': {reason}")]
    ToolLaunch { tool: String, reason: String },

    #[error("Audio {step} step failed for '{device}': {reason}")]
    AudioStep {
        step: &'static str,
        device: String,
        reason: String,
    },

    // Hotplug errors
    #[error("Hotplug monitor error: {0}")]
    Monitor(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl RipError {
    /// Returns true if the error must terminate the process.
    ///
    /// Everything else is logged and the event loop moves on to the next
    /// hotplug event.
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DriveIdentity { .. } | Self::ToolLaunch { .. } | Self::AudioStep { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NoDrivesFound => Some("Check that the optical drive is attached and visible under /dev/sr*"),
            Self::StatusQuery { .. } => Some("Ensure makemkvcon is installed and on PATH"),
            Self::ConfigNotFound { .. } => Some("Pass --config or set RIPPER_SETTINGS"),
            Self::OutputDir { .. } => Some("Check permissions of destination_dir"),
            Self::AudioStep { .. } => Some("Run the whipper step manually to inspect its output"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using RipError.
pub type Result<T> = std::result::Result<T, RipError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| RipError::Other(format!("{}: {e}", f().into())))
    }
}
