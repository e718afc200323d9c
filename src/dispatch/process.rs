//! Long-running subprocesses with stdout streamed into the log.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, RipError};

/// Spawn `cmd`, log each stdout line as it arrives, and wait for exit.
///
/// Blocks until the child exits. Stderr is inherited. Lines that are not
/// valid UTF-8 are logged lossily.
pub fn run_streaming(cmd: &mut Command, tool: &str) -> Result<ExitStatus> {
    debug!(tool, command = ?cmd, "Spawning external tool");
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| RipError::ToolLaunch {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(stdout) = child.stdout.take() {
        if let Err(e) = stream_lines(stdout, tool) {
            return Err(abandon(&mut child, tool, e));
        }
    }

    Ok(child.wait()?)
}

fn stream_lines(stdout: impl Read, tool: &str) -> io::Result<()> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            info!(tool, "{line}");
        }
    }
}

/// Kill and reap a child whose output can no longer be read.
fn abandon(child: &mut Child, tool: &str, error: io::Error) -> RipError {
    warn!(tool, pid = child.id(), error = %error, "Lost tool output; killing it");
    // the child may already have exited on its own
    let _ = child.kill();
    if let Err(e) = child.wait() {
        warn!(tool, error = %e, "Failed to reap tool");
    }
    error.into()
}
