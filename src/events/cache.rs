//! Last-known attribute set per device.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::trace;

/// Maps a device's sysfs path to the attributes of its latest event.
///
/// Owned by the event loop and handed to the reconciler by `&mut`, so
/// there is exactly one writer. Entries are replaced wholesale and never
/// evicted; the key space is bounded by the number of physical drives.
#[derive(Debug, Clone, Default)]
pub struct DeviceCache {
    entries: HashMap<PathBuf, BTreeMap<String, String>>,
}

impl DeviceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `attributes` for `sys_path`, returning the previous set.
    pub fn record(
        &mut self,
        sys_path: &Path,
        attributes: BTreeMap<String, String>,
    ) -> Option<BTreeMap<String, String>> {
        trace!(sys_path = %sys_path.display(), attributes = attributes.len(), "Caching device attributes");
        self.entries.insert(sys_path.to_path_buf(), attributes)
    }

    #[must_use]
    pub fn get(&self, sys_path: &Path) -> Option<&BTreeMap<String, String>> {
        self.entries.get(sys_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
