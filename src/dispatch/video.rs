//! Video ripping through `makemkvcon`.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{info, instrument};

use super::process::run_streaming;
use crate::drive::drive_number;
use crate::error::{Result, RipError};

/// Runs `<program> -r mkv disc:<N> all <output>`.
#[derive(Debug, Clone)]
pub struct VideoRipper {
    program: String,
}

impl VideoRipper {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for ripping every title of drive `drive_index` into `output`.
    #[must_use]
    pub fn args(drive_index: &str, output: &Path) -> Vec<String> {
        vec![
            "-r".to_string(),
            "mkv".to_string(),
            format!("disc:{}", drive_number(drive_index)),
            "all".to_string(),
            output.display().to_string(),
        ]
    }

    /// Create `output` and rip into it. Returns the tool's exit code.
    ///
    /// # Errors
    ///
    /// [`RipError::OutputDir`] if the directory cannot be created, which is
    /// fatal, and [`RipError::ToolLaunch`] if the tool cannot be started.
    #[instrument(skip(self), fields(tool = %self.program, output = %output.display()))]
    pub fn rip(&self, drive_index: &str, output: &Path) -> Result<Option<i32>> {
        fs::create_dir_all(output).map_err(|source| RipError::OutputDir {
            path: output.to_path_buf(),
            source,
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(drive_index, output));
        let status = run_streaming(&mut cmd, &self.program)?;

        let code = status.code();
        info!(exit_status = ?code, "Video rip finished");
        Ok(code)
    }
}
