//! Media ejection.

use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Eject outcomes. Neither is ever fatal: the rip already finished.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EjectError {
    #[error("Eject not supported for `{device}`: {reason}")]
    Unsupported { device: String, reason: String },

    #[error("Eject of `{device}` failed: {reason}")]
    Failed { device: String, reason: String },
}

/// Something that can open a drive tray.
pub trait Ejector {
    fn eject(&self, device_node: &Path) -> std::result::Result<(), EjectError>;
}

/// Ejects by running the `eject` program.
#[derive(Debug, Clone)]
pub struct EjectCommand {
    program: String,
}

impl EjectCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Ejector for EjectCommand {
    fn eject(&self, device_node: &Path) -> std::result::Result<(), EjectError> {
        let device = device_node.display().to_string();
        debug!(program = %self.program, %device, "Running eject");

        let output = Command::new(&self.program)
            .arg(device_node)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    EjectError::Unsupported {
                        device: device.clone(),
                        reason: e.to_string(),
                    }
                }
                _ => EjectError::Failed {
                    device: device.clone(),
                    reason: e.to_string(),
                },
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(EjectError::Failed {
                device,
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}
