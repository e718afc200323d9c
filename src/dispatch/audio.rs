//! Audio CD ripping with calibration gates.
//!
//! Before a drive can rip accurately the audio tool needs a profile of
//! the drive (cache behaviour) and its read offset. Both are stored per
//! drive identity. Missing calibration is produced on demand, in a fixed
//! order: profile analysis, then offset detection, then the rip.

use std::path::Path;

use tracing::{info, instrument};

use crate::drive::DriveIdentity;
use crate::error::Result;

/// Contract of the audio ripping collaborator.
pub trait AudioToolkit {
    /// Resolve vendor, model and firmware release for a device node.
    fn device_info(&self, device_node: &Path) -> Result<DriveIdentity>;

    /// Whether a drive profile is stored for `identity`.
    fn has_profile(&self, identity: &DriveIdentity) -> Result<bool>;

    /// Analyse the drive and store its profile.
    fn analyze(&self, device_node: &Path) -> Result<()>;

    /// Whether a read offset is stored for `identity`.
    fn has_offset(&self, identity: &DriveIdentity) -> Result<bool>;

    /// Detect and store the drive's read offset.
    fn find_offset(&self, device_node: &Path) -> Result<()>;

    /// Rip the disc into `output`, keeping the tool's log under `work_dir`.
    fn rip(&self, device_node: &Path, output: &Path, work_dir: &Path) -> Result<()>;
}

/// Run the calibration gates and then the rip.
///
/// Any gate failure aborts the whole audio dispatch; later steps are not
/// attempted against an uncalibrated drive.
#[instrument(skip(toolkit), fields(device = %device_node.display(), output = %output.display()))]
pub fn rip_audio<T>(toolkit: &T, device_node: &Path, output: &Path) -> Result<()>
where
    T: AudioToolkit + ?Sized,
{
    info!("Ripping audio");
    let identity = toolkit.device_info(device_node)?;

    if !toolkit.has_profile(&identity)? {
        info!(drive = %identity, "Analyzing drive");
        toolkit.analyze(device_node)?;
    }

    if !toolkit.has_offset(&identity)? {
        info!(drive = %identity, "Finding read offset");
        toolkit.find_offset(device_node)?;
    }

    let work_dir = output.parent().unwrap_or(output);
    toolkit.rip(device_node, output, work_dir)?;
    info!("Audio rip finished");
    Ok(())
}
