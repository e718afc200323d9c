//! Mock status reader for testing without a status tool.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoripper::drive::mock::MockStatusReader;
//! use autoripper::drive::{DriveStatusReader, MediaCategory};
//!
//! let reader = MockStatusReader::new().with_drive("DRV:0", "/dev/sr0", MediaCategory::Dvd);
//! let snapshot = reader.snapshot().unwrap();
//! assert_eq!(reader.snapshot_count(), 1);
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use super::media::MediaCategory;
use super::status::{DriveSnapshot, DriveStatusEntry};
use super::DriveStatusReader;
use crate::error::{Result, RipError};

/// Status reader that serves a canned drive table.
#[derive(Debug, Default)]
pub struct MockStatusReader {
    entries: Mutex<Vec<DriveStatusEntry>>,
    error_injection: Mutex<Option<RipError>>,
    snapshots: AtomicUsize,
}

impl MockStatusReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a drive row with the given media.
    #[must_use]
    pub fn with_drive(self, index: &str, device_node: &str, media: MediaCategory) -> Self {
        self.entries
            .lock()
            .unwrap()
            .push(mock_entry(index, device_node, media));
        self
    }

    /// Change the media of every row for `device_node`.
    pub fn set_media(&self, device_node: &str, media: MediaCategory) {
        for entry in self.entries.lock().unwrap().iter_mut() {
            if entry.device_node == device_node {
                entry.media = media;
            }
        }
    }

    /// Fail the next snapshot with `error`.
    pub fn inject_error(&self, error: RipError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Number of snapshots taken so far.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl DriveStatusReader for MockStatusReader {
    fn snapshot(&self) -> Result<DriveSnapshot> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        let entries = self.entries.lock().unwrap().clone();
        trace!(rows = entries.len(), "Serving mock snapshot");
        Ok(DriveSnapshot::new(entries))
    }
}

/// Build a plausible status row.
fn mock_entry(index: &str, device_node: &str, media: MediaCategory) -> DriveStatusEntry {
    let (visible, state) = match media {
        MediaCategory::Empty => ("0", "0"),
        MediaCategory::Open => ("1", "0"),
        MediaCategory::Loading => ("3", "0"),
        MediaCategory::Audio => ("2", "0"),
        MediaCategory::Dvd => ("2", "1"),
        MediaCategory::BluRay => ("2", "12"),
        MediaCategory::Unknown => ("2", "99"),
    };
    DriveStatusEntry {
        index: index.to_string(),
        visible: visible.to_string(),
        enabled: "999".to_string(),
        state: state.to_string(),
        name: "MOCK DRIVE".to_string(),
        label: String::new(),
        device_node: device_node.to_string(),
        media,
    }
}
