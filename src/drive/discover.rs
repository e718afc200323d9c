//! Startup discovery of optical drives through udev.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, RipError};

/// An optical drive known to udev.
#[derive(Debug, Clone, Serialize)]
pub struct OpticalDrive {
    /// Device node, e.g. `/dev/sr0`.
    pub device_node: PathBuf,
    /// Kernel sysfs path.
    pub sys_path: PathBuf,
    /// `ID_MODEL` property, when udev has one.
    pub model: Option<String>,
}

/// Enumerate block devices that udev tags with `ID_CDROM=1`.
///
/// Fails with [`RipError::NoDrivesFound`] when nothing is found, since the
/// daemon has nothing to watch.
#[instrument]
pub fn discover_drives() -> Result<Vec<OpticalDrive>> {
    let monitor_err = |e: std::io::Error| RipError::Monitor(format!("udev enumeration: {e}"));

    let mut enumerator = udev::Enumerator::new().map_err(monitor_err)?;
    enumerator.match_subsystem("block").map_err(monitor_err)?;
    enumerator
        .match_property("ID_CDROM", "1")
        .map_err(monitor_err)?;

    let drives: Vec<OpticalDrive> = enumerator
        .scan_devices()
        .map_err(monitor_err)?
        .filter_map(|device| {
            let device_node = device.devnode()?.to_path_buf();
            debug!(device = %device_node.display(), "Optical drive enumerated");
            Some(OpticalDrive {
                device_node,
                sys_path: device.syspath().to_path_buf(),
                model: device
                    .property_value("ID_MODEL")
                    .map(|v| v.to_string_lossy().into_owned()),
            })
        })
        .collect();

    if drives.is_empty() {
        return Err(RipError::NoDrivesFound);
    }

    let nodes: Vec<_> = drives
        .iter()
        .map(|d| d.device_node.display().to_string())
        .collect();
    info!(drives = ?nodes, "Found drives");
    Ok(drives)
}
