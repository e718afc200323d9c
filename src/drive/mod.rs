//! Optical drive status and identity.
//!
//! The [`DriveStatusReader`] trait abstracts the status-query tool so the
//! reconciliation logic can be exercised against canned snapshots.

mod discover;
mod identity;
mod media;
pub mod mock;
mod status;

pub use discover::{OpticalDrive, discover_drives};
pub use identity::{DriveIdentity, SYS_CLASS_BLOCK, SysfsIdentityReader};
pub use media::{MediaCategory, MediaStateTable};
pub use status::{
    DriveSnapshot, DriveStatusEntry, MakemkvStatusReader, NO_DRIVE_SENTINEL, drive_number,
    parse_status_output,
};

use crate::error::Result;

/// Source of drive status snapshots.
///
/// Every call performs a fresh read; snapshots are never cached or
/// mutated after construction.
pub trait DriveStatusReader {
    /// Read the current state of every drive slot.
    ///
    /// # Errors
    ///
    /// Returns [`RipError::StatusQuery`](crate::error::RipError::StatusQuery)
    /// if the tool cannot be run and
    /// [`RipError::StatusParse`](crate::error::RipError::StatusParse) if its
    /// output is malformed.
    fn snapshot(&self) -> Result<DriveSnapshot>;
}

impl<T: DriveStatusReader + ?Sized> DriveStatusReader for Box<T> {
    fn snapshot(&self) -> Result<DriveSnapshot> {
        (**self).snapshot()
    }
}
