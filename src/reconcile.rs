//! Reconciliation of hotplug events against drive status.
//!
//! A hotplug event only says that *something* changed on a block device.
//! The authoritative media state comes from a fresh status snapshot,
//! joined to the event by device node. One event yields at most one
//! dispatch decision.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::drive::{DriveStatusReader, MediaCategory};
use crate::error::Result;
use crate::events::{DeviceCache, RawDeviceEvent};

/// Which ripping workflow a decision calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKind {
    Video,
    Audio,
}

/// A resolved instruction to rip one disc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchDecision {
    pub media: MediaCategory,
    pub device_node: PathBuf,
    pub drive_index: String,
    pub output_path: PathBuf,
}

impl DispatchDecision {
    /// Video for DVD and Blu-ray, audio otherwise.
    #[must_use]
    pub const fn kind(&self) -> DispatchKind {
        if self.media.is_video() {
            DispatchKind::Video
        } else {
            DispatchKind::Audio
        }
    }
}

/// Why a cycle produced no dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The kernel reported a device the status tool does not list.
    Unmatched { dev_name: Option<String> },
    /// The tray was opened.
    Ejected { device_node: PathBuf },
    /// Empty, loading or unknown media.
    Unhandled {
        device_node: PathBuf,
        media: MediaCategory,
    },
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reconciliation {
    Dispatch(DispatchDecision),
    Skip(SkipReason),
}

impl Reconciliation {
    #[must_use]
    pub const fn decision(&self) -> Option<&DispatchDecision> {
        match self {
            Self::Dispatch(d) => Some(d),
            Self::Skip(_) => None,
        }
    }
}

/// Joins raw events to status snapshots.
#[derive(Debug, Clone)]
pub struct Reconciler {
    destination_dir: PathBuf,
}

impl Reconciler {
    #[must_use]
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
        }
    }

    #[must_use]
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Run one cycle for `event`.
    ///
    /// The event's attributes are stored in `cache` before anything else,
    /// so the cache reflects the event even when the cycle is skipped or
    /// the status query fails.
    ///
    /// # Errors
    ///
    /// Propagates status reader failures unchanged.
    #[instrument(skip_all, fields(sys_path = %event.sys_path.display(), action = %event.action))]
    pub fn reconcile<R>(
        &self,
        event: &RawDeviceEvent,
        cache: &mut DeviceCache,
        reader: &R,
    ) -> Result<Reconciliation>
    where
        R: DriveStatusReader + ?Sized,
    {
        info!(
            subsystem = event.subsystem.as_deref().unwrap_or("?"),
            "Device event received"
        );
        cache.record(&event.sys_path, event.attributes.clone());

        let snapshot = reader.snapshot()?;

        let Some(dev_name) = event.dev_name() else {
            warn!("Event carries no DEVNAME; skipping");
            return Ok(Reconciliation::Skip(SkipReason::Unmatched { dev_name: None }));
        };

        let Some(status) = snapshot.find_by_device(dev_name) else {
            warn!(device = dev_name, "No drive status for device; skipping");
            return Ok(Reconciliation::Skip(SkipReason::Unmatched {
                dev_name: Some(dev_name.to_string()),
            }));
        };

        let media = status.media;
        let device_node = PathBuf::from(&status.device_node);
        info!(device = %status.device_node, %media, "Drive changed media state");

        let outcome = match media {
            MediaCategory::Dvd | MediaCategory::BluRay | MediaCategory::Audio => {
                Reconciliation::Dispatch(DispatchDecision {
                    media,
                    output_path: self.destination_dir.join(media.as_str()),
                    drive_index: status.index.clone(),
                    device_node,
                })
            }
            MediaCategory::Open => {
                info!(device = %status.device_node, "The media was ejected");
                Reconciliation::Skip(SkipReason::Ejected { device_node })
            }
            MediaCategory::Empty | MediaCategory::Loading | MediaCategory::Unknown => {
                error!(device = %status.device_node, %media, "Unhandled media state");
                Reconciliation::Skip(SkipReason::Unhandled { device_node, media })
            }
        };
        Ok(outcome)
    }
}
