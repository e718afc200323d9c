//! `whipper` as the audio toolkit.
//!
//! Calibration state lives in whipper's own INI config, one
//! `[drive:...]` section per drive keyed by vendor, model and release.
//! A section means the drive was analysed; a `read_offset` key in it
//! means the offset is known.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::audio::AudioToolkit;
use super::process::run_streaming;
use crate::drive::{DriveIdentity, SysfsIdentityReader};
use crate::error::{Result, ResultExt, RipError};

const DRIVE_SECTION_PREFIX: &str = "drive:";

/// Location of whipper's config when none is configured.
#[must_use]
pub fn default_whipper_config() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/root/.config"))
        .join("whipper")
        .join("whipper.conf")
}

/// Drive sections of a whipper config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhipperConfig {
    drives: Vec<BTreeMap<String, String>>,
}

impl WhipperConfig {
    /// Parse INI text, keeping only `drive:` sections.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut drives = Vec::new();
        let mut current: Option<BTreeMap<String, String>> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if let Some(section) = current.take() {
                    drives.push(section);
                }
                if name.starts_with(DRIVE_SECTION_PREFIX) {
                    current = Some(BTreeMap::new());
                }
                continue;
            }
            if let Some(section) = current.as_mut() {
                if let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) {
                    section.insert(key.trim().to_lowercase(), value.trim().to_string());
                }
            }
        }
        if let Some(section) = current {
            drives.push(section);
        }

        Self { drives }
    }

    /// Read and parse `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No whipper config yet");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn find_drive(&self, identity: &DriveIdentity) -> Option<&BTreeMap<String, String>> {
        self.drives.iter().find(|section| {
            section.get("vendor").map(String::as_str) == Some(identity.vendor.as_str())
                && section.get("model").map(String::as_str) == Some(identity.model.as_str())
                && section.get("release").map(String::as_str) == Some(identity.release.as_str())
        })
    }

    /// Whether the drive has been analysed.
    #[must_use]
    pub fn has_profile(&self, identity: &DriveIdentity) -> bool {
        self.find_drive(identity).is_some()
    }

    /// Stored read offset, if any.
    #[must_use]
    pub fn read_offset(&self, identity: &DriveIdentity) -> Option<i32> {
        self.find_drive(identity)?
            .get("read_offset")
            .and_then(|v| v.parse().ok())
    }
}

/// Runs the `whipper` program for every audio step.
#[derive(Debug, Clone)]
pub struct WhipperToolkit {
    program: String,
    config_path: PathBuf,
    identity: SysfsIdentityReader,
}

impl WhipperToolkit {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            config_path: default_whipper_config(),
            identity: SysfsIdentityReader::default(),
        }
    }

    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    #[must_use]
    pub fn with_identity_reader(mut self, reader: SysfsIdentityReader) -> Self {
        self.identity = reader;
        self
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn run_step(&self, step: &'static str, device_node: &Path, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        let status = run_streaming(&mut cmd, &self.program)?;
        if status.success() {
            Ok(())
        } else {
            warn!(step, %status, "whipper step failed");
            Err(RipError::AudioStep {
                step,
                device: device_node.display().to_string(),
                reason: status.to_string(),
            })
        }
    }

    fn device_arg(device_node: &Path) -> String {
        device_node.display().to_string()
    }
}

impl AudioToolkit for WhipperToolkit {
    fn device_info(&self, device_node: &Path) -> Result<DriveIdentity> {
        self.identity.read(device_node)
    }

    fn has_profile(&self, identity: &DriveIdentity) -> Result<bool> {
        Ok(WhipperConfig::load(&self.config_path)?.has_profile(identity))
    }

    fn analyze(&self, device_node: &Path) -> Result<()> {
        let dev = Self::device_arg(device_node);
        self.run_step("analyze", device_node, &["drive", "analyze", "-d", &dev])
    }

    fn has_offset(&self, identity: &DriveIdentity) -> Result<bool> {
        Ok(WhipperConfig::load(&self.config_path)?
            .read_offset(identity)
            .is_some())
    }

    fn find_offset(&self, device_node: &Path) -> Result<()> {
        let dev = Self::device_arg(device_node);
        self.run_step("offset", device_node, &["offset", "find", "-d", &dev])
    }

    fn rip(&self, device_node: &Path, output: &Path, work_dir: &Path) -> Result<()> {
        let dev = Self::device_arg(device_node);
        let out = output.display().to_string();
        let work = work_dir.display().to_string();
        self.run_step(
            "rip",
            device_node,
            &["cd", "-d", &dev, "rip", "-O", &out, "-W", &work],
        )
    }
}
