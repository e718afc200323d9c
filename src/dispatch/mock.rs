//! Recording doubles for the dispatch layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoripper::dispatch::mock::{AudioOp, MockAudioToolkit};
//! use autoripper::dispatch::rip_audio;
//!
//! let toolkit = MockAudioToolkit::new();
//! rip_audio(&toolkit, "/dev/sr0".as_ref(), "/rips/audio".as_ref()).unwrap();
//! assert_eq!(toolkit.gate_order(), vec![AudioOp::Analyze, AudioOp::FindOffset]);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::trace;

use super::audio::AudioToolkit;
use super::eject::{EjectError, Ejector};
use super::{DispatchReport, Dispatcher};
use crate::drive::DriveIdentity;
use crate::error::{Result, RipError};
use crate::reconcile::DispatchKind;

/// Recorded audio toolkit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOp {
    DeviceInfo,
    HasProfile,
    Analyze,
    HasOffset,
    FindOffset,
    Rip { output: PathBuf, work_dir: PathBuf },
}

/// Audio toolkit with in-memory calibration state.
///
/// Successful `analyze`/`find_offset` calls store the calibration, as the
/// real tool does.
#[derive(Debug, Default)]
pub struct MockAudioToolkit {
    profile: AtomicBool,
    offset: AtomicBool,
    fail_step: Option<&'static str>,
    ops: Mutex<Vec<AudioOp>>,
}

impl MockAudioToolkit {
    /// A drive with no stored calibration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A drive with profile and offset already stored.
    #[must_use]
    pub fn calibrated() -> Self {
        Self::new().with_profile(true).with_offset(true)
    }

    #[must_use]
    pub fn with_profile(self, stored: bool) -> Self {
        self.profile.store(stored, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn with_offset(self, stored: bool) -> Self {
        self.offset.store(stored, Ordering::SeqCst);
        self
    }

    /// Make `step` ("analyze", "offset" or "rip") exit unsuccessfully.
    #[must_use]
    pub fn failing_at(mut self, step: &'static str) -> Self {
        self.fail_step = Some(step);
        self
    }

    /// Every call in order.
    pub fn operations(&self) -> Vec<AudioOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Only the side-effecting calls, in order.
    pub fn gate_order(&self) -> Vec<AudioOp> {
        self.operations()
            .into_iter()
            .filter(|op| matches!(op, AudioOp::Analyze | AudioOp::FindOffset))
            .collect()
    }

    fn record(&self, op: AudioOp) {
        trace!(?op, "Mock audio call");
        self.ops.lock().unwrap().push(op);
    }

    fn step(&self, step: &'static str, device_node: &Path) -> Result<()> {
        if self.fail_step == Some(step) {
            return Err(RipError::AudioStep {
                step,
                device: device_node.display().to_string(),
                reason: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

impl AudioToolkit for MockAudioToolkit {
    fn device_info(&self, _device_node: &Path) -> Result<DriveIdentity> {
        self.record(AudioOp::DeviceInfo);
        Ok(DriveIdentity {
            vendor: "MOCK".to_string(),
            model: "DRIVE".to_string(),
            release: "1.0".to_string(),
        })
    }

    fn has_profile(&self, _identity: &DriveIdentity) -> Result<bool> {
        self.record(AudioOp::HasProfile);
        Ok(self.profile.load(Ordering::SeqCst))
    }

    fn analyze(&self, device_node: &Path) -> Result<()> {
        self.record(AudioOp::Analyze);
        self.step("analyze", device_node)?;
        self.profile.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn has_offset(&self, _identity: &DriveIdentity) -> Result<bool> {
        self.record(AudioOp::HasOffset);
        Ok(self.offset.load(Ordering::SeqCst))
    }

    fn find_offset(&self, device_node: &Path) -> Result<()> {
        self.record(AudioOp::FindOffset);
        self.step("offset", device_node)?;
        self.offset.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn rip(&self, device_node: &Path, output: &Path, work_dir: &Path) -> Result<()> {
        self.record(AudioOp::Rip {
            output: output.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
        });
        self.step("rip", device_node)
    }
}

/// Ejector that records device nodes.
#[derive(Debug, Default)]
pub struct MockEjector {
    failure: Option<EjectError>,
    ejected: Mutex<Vec<PathBuf>>,
}

impl MockEjector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(mut self, error: EjectError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Devices for which an eject was attempted.
    pub fn ejected(&self) -> Vec<PathBuf> {
        self.ejected.lock().unwrap().clone()
    }
}

impl Ejector for MockEjector {
    fn eject(&self, device_node: &Path) -> std::result::Result<(), EjectError> {
        self.ejected.lock().unwrap().push(device_node.to_path_buf());
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Recorded dispatcher call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCall {
    Video {
        drive_index: String,
        device_node: PathBuf,
        output: PathBuf,
    },
    Audio {
        device_node: PathBuf,
        output: PathBuf,
    },
}

/// Dispatcher that records calls without running anything.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    calls: Mutex<Vec<DispatchCall>>,
    error_injection: Mutex<Option<RipError>>,
}

impl MockDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next dispatch with `error`.
    pub fn inject_error(&self, error: RipError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn finish(&self, call: DispatchCall) -> Result<DispatchReport> {
        let (kind, device_node, output) = match &call {
            DispatchCall::Video {
                device_node,
                output,
                ..
            } => (DispatchKind::Video, device_node.clone(), output.clone()),
            DispatchCall::Audio {
                device_node,
                output,
            } => (DispatchKind::Audio, device_node.clone(), output.clone()),
        };
        self.calls.lock().unwrap().push(call);

        if let Some(e) = self.error_injection.lock().unwrap().take() {
            return Err(e);
        }
        let now = Utc::now();
        Ok(DispatchReport {
            kind,
            device_node,
            output_path: output,
            exit_code: (kind == DispatchKind::Video).then_some(0),
            ejected: kind == DispatchKind::Video,
            started_at: now,
            finished_at: now,
        })
    }
}

impl Dispatcher for MockDispatcher {
    fn dispatch_video(
        &self,
        drive_index: &str,
        device_node: &Path,
        output: &Path,
    ) -> Result<DispatchReport> {
        self.finish(DispatchCall::Video {
            drive_index: drive_index.to_string(),
            device_node: device_node.to_path_buf(),
            output: output.to_path_buf(),
        })
    }

    fn dispatch_audio(&self, device_node: &Path, output: &Path) -> Result<DispatchReport> {
        self.finish(DispatchCall::Audio {
            device_node: device_node.to_path_buf(),
            output: output.to_path_buf(),
        })
    }
}
