//! Drive hardware identity (vendor, model, firmware revision) from sysfs.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use crate::error::{Result, RipError};

/// Default sysfs block class directory.
pub const SYS_CLASS_BLOCK: &str = "/sys/class/block";

/// Identity of an optical drive as used to key calibration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveIdentity {
    pub vendor: String,
    pub model: String,
    pub release: String,
}

impl fmt::Display for DriveIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.vendor, self.model, self.release)
    }
}

/// Reads drive identity attributes below a sysfs root.
#[derive(Debug, Clone)]
pub struct SysfsIdentityReader {
    root: PathBuf,
}

impl Default for SysfsIdentityReader {
    fn default() -> Self {
        Self::new(SYS_CLASS_BLOCK)
    }
}

impl SysfsIdentityReader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Look up `vendor`, `model` and `rev` for a device node like `/dev/sr0`.
    pub fn read(&self, device_node: &Path) -> Result<DriveIdentity> {
        let name = device_node.file_name().ok_or_else(|| RipError::DriveIdentity {
            device: device_node.display().to_string(),
            reason: "device node has no file name".to_string(),
        })?;
        let dir = self.root.join(name).join("device");
        trace!(dir = %dir.display(), "Reading drive identity");

        let attr = |attr: &str| -> Result<String> {
            fs::read_to_string(dir.join(attr))
                .map(|s| s.trim().to_string())
                .map_err(|e| RipError::DriveIdentity {
                    device: device_node.display().to_string(),
                    reason: format!("{attr}: {e}"),
                })
        };

        Ok(DriveIdentity {
            vendor: attr("vendor")?,
            model: attr("model")?,
            release: attr("rev")?,
        })
    }
}
