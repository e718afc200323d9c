//! Dispatch of rip workflows for resolved decisions.
//!
//! The [`Dispatcher`] trait is the seam between reconciliation and the
//! external ripping tools. [`RipDispatcher`] is the production
//! implementation; [`mock`] provides recording doubles for tests.

mod audio;
mod eject;
pub mod mock;
mod process;
mod video;
mod whipper;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

pub use audio::{AudioToolkit, rip_audio};
pub use eject::{EjectCommand, EjectError, Ejector};
pub use process::run_streaming;
pub use video::VideoRipper;
pub use whipper::{WhipperConfig, WhipperToolkit, default_whipper_config};

use crate::config::Settings;
use crate::error::{Result, RipError};
use crate::reconcile::{DispatchDecision, DispatchKind};

/// What a finished dispatch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: DispatchKind,
    pub device_node: PathBuf,
    pub output_path: PathBuf,
    /// Exit code of the video tool. Audio steps fail via errors instead.
    pub exit_code: Option<i32>,
    pub ejected: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs rip workflows. Every call blocks until the workflow finishes.
pub trait Dispatcher {
    fn dispatch_video(
        &self,
        drive_index: &str,
        device_node: &Path,
        output: &Path,
    ) -> Result<DispatchReport>;

    fn dispatch_audio(&self, device_node: &Path, output: &Path) -> Result<DispatchReport>;

    /// Route a decision to the matching workflow.
    fn dispatch(&self, decision: &DispatchDecision) -> Result<DispatchReport> {
        match decision.kind() {
            DispatchKind::Video => self.dispatch_video(
                &decision.drive_index,
                &decision.device_node,
                &decision.output_path,
            ),
            DispatchKind::Audio => {
                self.dispatch_audio(&decision.device_node, &decision.output_path)
            }
        }
    }
}

impl<T: Dispatcher + ?Sized> Dispatcher for Box<T> {
    fn dispatch_video(
        &self,
        drive_index: &str,
        device_node: &Path,
        output: &Path,
    ) -> Result<DispatchReport> {
        (**self).dispatch_video(drive_index, device_node, output)
    }

    fn dispatch_audio(&self, device_node: &Path, output: &Path) -> Result<DispatchReport> {
        (**self).dispatch_audio(device_node, output)
    }
}

/// Production dispatcher: video tool, audio toolkit and ejector.
#[derive(Debug, Clone)]
pub struct RipDispatcher<A, E> {
    video: VideoRipper,
    audio: A,
    ejector: E,
}

impl RipDispatcher<WhipperToolkit, EjectCommand> {
    /// Build from the configured tool programs.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = WhipperToolkit::new(&settings.tools.whipper);
        if let Some(path) = &settings.tools.whipper_config {
            audio = audio.with_config_path(path);
        }
        Self::new(
            VideoRipper::new(&settings.tools.makemkvcon),
            audio,
            EjectCommand::new(&settings.tools.eject),
        )
    }
}

impl<A: AudioToolkit, E: Ejector> RipDispatcher<A, E> {
    #[must_use]
    pub const fn new(video: VideoRipper, audio: A, ejector: E) -> Self {
        Self {
            video,
            audio,
            ejector,
        }
    }

    #[must_use]
    pub const fn audio(&self) -> &A {
        &self.audio
    }

    #[must_use]
    pub const fn ejector(&self) -> &E {
        &self.ejector
    }

    fn eject(&self, device_node: &Path) -> bool {
        match self.ejector.eject(device_node) {
            Ok(()) => {
                info!(device = %device_node.display(), "Media ejected");
                true
            }
            Err(e) => {
                warn!(device = %device_node.display(), error = %e, "Eject did not succeed");
                false
            }
        }
    }
}

impl<A: AudioToolkit, E: Ejector> Dispatcher for RipDispatcher<A, E> {
    fn dispatch_video(
        &self,
        drive_index: &str,
        device_node: &Path,
        output: &Path,
    ) -> Result<DispatchReport> {
        let started_at = Utc::now();
        info!(drive = drive_index, device = %device_node.display(), "Starting video rip");

        let exit_code = self.video.rip(drive_index, output)?;
        let ejected = self.eject(device_node);

        Ok(DispatchReport {
            kind: DispatchKind::Video,
            device_node: device_node.to_path_buf(),
            output_path: output.to_path_buf(),
            exit_code,
            ejected,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn dispatch_audio(&self, device_node: &Path, output: &Path) -> Result<DispatchReport> {
        let started_at = Utc::now();
        info!(device = %device_node.display(), "Starting audio rip");

        fs::create_dir_all(output).map_err(|source| RipError::OutputDir {
            path: output.to_path_buf(),
            source,
        })?;
        rip_audio(&self.audio, device_node, output)?;

        Ok(DispatchReport {
            kind: DispatchKind::Audio,
            device_node: device_node.to_path_buf(),
            output_path: output.to_path_buf(),
            exit_code: None,
            ejected: false,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
