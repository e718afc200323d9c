//! Raw hotplug events and the per-device attribute cache.
//!
//! This layer is pure transport: it carries kernel/udev attributes through
//! unchanged and never interprets media semantics.

mod cache;
mod udev_source;

pub use cache::DeviceCache;
pub use udev_source::UdevEventSource;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;

/// Subsystem every source in this crate filters on.
pub const BLOCK_SUBSYSTEM: &str = "block";

/// Attribute carrying the device node, e.g. `/dev/sr0`.
pub const DEVNAME: &str = "DEVNAME";

/// Hotplug action type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAction {
    Add,
    Remove,
    Change,
    Bind,
    Unbind,
    Other(String),
}

impl DeviceAction {
    /// Parse the kernel `ACTION` string.
    #[must_use]
    pub fn parse(action: &str) -> Self {
        match action {
            "add" => Self::Add,
            "remove" => Self::Remove,
            "change" => Self::Change,
            "bind" => Self::Bind,
            "unbind" => Self::Unbind,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
            Self::Change => f.write_str("change"),
            Self::Bind => f.write_str("bind"),
            Self::Unbind => f.write_str("unbind"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One hotplug notification, consumed once by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawDeviceEvent {
    pub action: DeviceAction,
    /// Kernel device path, stable per physical slot.
    pub sys_path: PathBuf,
    pub subsystem: Option<String>,
    /// Every attribute of the device, including [`DEVNAME`].
    pub attributes: BTreeMap<String, String>,
}

impl RawDeviceEvent {
    #[must_use]
    pub fn new(action: DeviceAction, sys_path: impl Into<PathBuf>) -> Self {
        Self {
            action,
            sys_path: sys_path.into(),
            subsystem: Some(BLOCK_SUBSYSTEM.to_string()),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Synthetic `change` event for a device node like `/dev/sr0`.
    ///
    /// Used for manually triggered reconciliation cycles.
    #[must_use]
    pub fn synthetic_change(device_node: &str) -> Self {
        let name = device_node.rsplit('/').next().unwrap_or(device_node);
        Self::new(
            DeviceAction::Change,
            PathBuf::from("/sys/class/block").join(name),
        )
        .with_attribute(DEVNAME, device_node)
    }

    /// The device node attribute, when present.
    #[must_use]
    pub fn dev_name(&self) -> Option<&str> {
        self.attributes.get(DEVNAME).map(String::as_str)
    }
}

/// Producer of raw hotplug events.
pub trait DeviceEventSource {
    /// Pull one pending event, or `None` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel is broken.
    fn receive(&mut self) -> Result<Option<RawDeviceEvent>>;
}
