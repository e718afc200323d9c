//! Structured logging initialization.
//!
//! Console output goes to stderr in a human or machine-readable format.
//! The daemon additionally writes every line to a log file beside the
//! ripped output.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogRotation, Settings};
use crate::error::{Result, RipError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Where the file sink writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    pub directory: PathBuf,
    pub file_name: String,
    pub rotation: LogRotation,
}

impl FileSink {
    /// File sink described by the logging section of `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            directory: settings.log_directory().to_path_buf(),
            file_name: settings.logging.file_name.clone(),
            rotation: settings.logging.rotation,
        }
    }

    fn rotation(&self) -> Rotation {
        match self.rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
        }
    }

    fn appender(&self) -> Result<RollingFileAppender> {
        fs::create_dir_all(&self.directory).map_err(|source| RipError::OutputDir {
            path: self.directory.clone(),
            source,
        })?;
        RollingFileAppender::builder()
            .rotation(self.rotation())
            .filename_prefix(&self.file_name)
            .build(&self.directory)
            .map_err(|e| {
                RipError::Other(format!(
                    "cannot open log file in {}: {e}",
                    self.directory.display()
                ))
            })
    }

    /// Path of the active log file when rotation is disabled.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Filter directive for the given verbosity flags.
#[must_use]
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "autoripper=error";
    }
    match verbose {
        0 => "autoripper=info",
        1 => "autoripper=debug",
        _ => "autoripper=trace",
    }
}

fn console_layer(robot_mode: bool, no_color: bool) -> BoxedLayer {
    if robot_mode {
        fmt::layer()
            .json()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr)
            .boxed()
    } else if io::stderr().is_terminal() {
        fmt::layer()
            .with_ansi(!no_color)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(io::stderr)
            .boxed()
    }
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `robot_mode` - JSON lines on stderr instead of human output
/// * `verbose` - 0 = info, 1 = debug, 2+ = trace
/// * `quiet` - errors only
/// * `no_color` - disable ANSI styling on a terminal
/// * `file` - optional file sink; the returned guard must be held until
///   exit so buffered lines are flushed
///
/// # Environment Variables
///
/// * `RUST_LOG` - Override the default filter (e.g. "autoripper=debug")
///
/// # Output Behavior
///
/// | Mode | TTY | Console |
/// |------|-----|---------|
/// | Robot | any | JSON lines to stderr |
/// | Human | yes | Pretty colored output to stderr |
/// | Human | no | Compact plain output to stderr |
///
/// The file sink always writes plain text without ANSI codes.
pub fn init_logging(
    robot_mode: bool,
    verbose: u8,
    quiet: bool,
    no_color: bool,
    file: Option<&FileSink>,
) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(robot_mode, no_color)];
    let mut guard = None;

    if let Some(sink) = file {
        let (writer, worker_guard) = tracing_appender::non_blocking(sink.appender()?);
        guard = Some(worker_guard);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| RipError::Other(format!("logging already initialized: {e}")))?;

    Ok(guard)
}
