//! Media categories and the (state, subtype) lookup table.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic classification of whatever is in a drive slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    /// Tray closed, no disc.
    Empty,
    /// Tray open.
    Open,
    /// Drive is spinning up a disc.
    Loading,
    /// Audio CD.
    Audio,
    /// Video DVD.
    Dvd,
    /// Blu-ray disc.
    #[serde(rename = "bd")]
    BluRay,
    /// Anything the state table does not map.
    Unknown,
}

impl MediaCategory {
    /// Stable lowercase name, also used as the output sub-directory.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Open => "open",
            Self::Loading => "loading",
            Self::Audio => "audio",
            Self::Dvd => "dvd",
            Self::BluRay => "bd",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for disc types ripped by the video tool.
    #[must_use]
    pub const fn is_video(self) -> bool {
        matches!(self, Self::Dvd | Self::BluRay)
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed mapping of `(state code, subtype code)` to a media category.
///
/// The outer code is the drive's coarse state (0 empty, 1 open, 2 media
/// present, 3 loading); the inner code distinguishes disc types when media
/// is present. Lookups never fail: unmapped or non-numeric keys resolve to
/// [`MediaCategory::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStateTable {
    entries: HashMap<(u32, u32), MediaCategory>,
}

impl Default for MediaStateTable {
    fn default() -> Self {
        Self::empty()
            .with_mapping(0, 0, MediaCategory::Empty)
            .with_mapping(1, 0, MediaCategory::Open)
            .with_mapping(2, 0, MediaCategory::Audio)
            .with_mapping(2, 1, MediaCategory::Dvd)
            .with_mapping(2, 12, MediaCategory::BluRay)
            .with_mapping(2, 28, MediaCategory::BluRay)
            .with_mapping(3, 0, MediaCategory::Loading)
    }
}

impl MediaStateTable {
    /// A table with no mappings; every lookup yields `Unknown`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace a single mapping.
    #[must_use]
    pub fn with_mapping(mut self, state: u32, subtype: u32, media: MediaCategory) -> Self {
        self.entries.insert((state, subtype), media);
        self
    }

    /// Resolve numeric codes.
    #[must_use]
    pub fn resolve(&self, state: u32, subtype: u32) -> MediaCategory {
        self.entries
            .get(&(state, subtype))
            .copied()
            .unwrap_or(MediaCategory::Unknown)
    }

    /// Resolve codes exactly as they appear in the status tool output.
    #[must_use]
    pub fn lookup(&self, state: &str, subtype: &str) -> MediaCategory {
        match (state.trim().parse::<u32>(), subtype.trim().parse::<u32>()) {
            (Ok(state), Ok(subtype)) => self.resolve(state, subtype),
            _ => MediaCategory::Unknown,
        }
    }

    /// Number of mapped pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
