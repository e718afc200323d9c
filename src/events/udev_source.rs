//! udev-backed hotplug event source.

use std::collections::BTreeMap;
use std::os::unix::io::{AsRawFd, RawFd};

use tracing::{debug, info};

use super::{BLOCK_SUBSYSTEM, DeviceAction, DeviceEventSource, RawDeviceEvent};
use crate::error::{Result, RipError};

/// Netlink subscription to `block` subsystem events.
///
/// The monitor socket is non-blocking; its descriptor is exposed so the
/// event loop can wait for readiness before calling
/// [`receive`](DeviceEventSource::receive).
pub struct UdevEventSource {
    socket: udev::MonitorSocket,
}

impl UdevEventSource {
    /// Subscribe to block device notifications.
    pub fn open() -> Result<Self> {
        let socket = udev::MonitorBuilder::new()
            .and_then(|b| b.match_subsystem(BLOCK_SUBSYSTEM))
            .and_then(udev::MonitorBuilder::listen)
            .map_err(|e| RipError::Monitor(format!("failed to open udev monitor: {e}")))?;

        info!(subsystem = BLOCK_SUBSYSTEM, "Listening for hotplug events");
        Ok(Self { socket })
    }
}

impl DeviceEventSource for UdevEventSource {
    fn receive(&mut self) -> Result<Option<RawDeviceEvent>> {
        let Some(event) = self.socket.iter().next() else {
            return Ok(None);
        };

        let action = match event.event_type() {
            udev::EventType::Add => DeviceAction::Add,
            udev::EventType::Remove => DeviceAction::Remove,
            udev::EventType::Change => DeviceAction::Change,
            udev::EventType::Bind => DeviceAction::Bind,
            udev::EventType::Unbind => DeviceAction::Unbind,
            udev::EventType::Unknown => DeviceAction::Other(
                event
                    .action()
                    .map_or_else(|| "unknown".to_string(), |a| a.to_string_lossy().into_owned()),
            ),
        };

        let attributes: BTreeMap<String, String> = event
            .properties()
            .map(|entry| {
                (
                    entry.name().to_string_lossy().into_owned(),
                    entry.value().to_string_lossy().into_owned(),
                )
            })
            .collect();

        let raw = RawDeviceEvent {
            action,
            sys_path: event.syspath().to_path_buf(),
            subsystem: event
                .subsystem()
                .map(|s| s.to_string_lossy().into_owned()),
            attributes,
        };
        debug!(action = %raw.action, sys_path = %raw.sys_path.display(), "Raw hotplug event");
        Ok(Some(raw))
    }
}

impl AsRawFd for UdevEventSource {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
