//! Drive status snapshots read from the status-query tool.
//!
//! The tool prints one comma-delimited record per line. Drive rows look like
//!
//! ```text
//! DRV:0,2,999,1,"MATSHITA","DVD-RAM","/dev/sr0"
//! ```
//!
//! where the second field is the coarse drive state and the fourth the
//! disc subtype. Everything that is not a drive row is ignored.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use super::DriveStatusReader;
use super::media::{MediaCategory, MediaStateTable};
use crate::config::Settings;
use crate::error::{Result, RipError};

/// Connection status meaning "no drive in this slot".
pub const NO_DRIVE_SENTINEL: &str = "256";

/// Number of positional fields a drive row must carry.
const DRIVE_ROW_FIELDS: usize = 7;

static DRIVE_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DRV:\d+").expect("drive record pattern is valid"));

/// One physical drive slot as reported by the status tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveStatusEntry {
    /// Drive identifier, e.g. `DRV:0`.
    pub index: String,
    /// Second positional field. The tool puts the coarse drive state code
    /// here (0 empty, 1 open, 2 media present, 3 loading, 256 no drive).
    pub visible: String,
    pub enabled: String,
    /// Fourth positional field: the disc subtype code, meaningful when
    /// media is present.
    pub state: String,
    /// Drive name (vendor and model as reported by the tool).
    pub name: String,
    /// Disc label, empty when no disc.
    pub label: String,
    /// OS device node, e.g. `/dev/sr0`.
    pub device_node: String,
    /// Resolved media category.
    pub media: MediaCategory,
}

impl DriveStatusEntry {
    /// Numeric coarse state code, read from [`visible`](Self::visible).
    #[must_use]
    pub fn raw_state(&self) -> Option<u32> {
        self.visible.parse().ok()
    }

    /// Numeric disc subtype code, read from [`state`](Self::state).
    #[must_use]
    pub fn raw_subtype(&self) -> Option<u32> {
        self.state.parse().ok()
    }

    /// Digits of the drive index (`DRV:12` → `12`), as the video tool expects.
    #[must_use]
    pub fn drive_number(&self) -> String {
        drive_number(&self.index)
    }
}

/// Strip everything but ASCII digits from a drive index.
#[must_use]
pub fn drive_number(index: &str) -> String {
    index.chars().filter(char::is_ascii_digit).collect()
}

/// Immutable point-in-time read of every drive slot.
#[derive(Debug, Clone, Serialize)]
pub struct DriveSnapshot {
    taken_at: DateTime<Utc>,
    entries: Vec<DriveStatusEntry>,
}

impl DriveSnapshot {
    #[must_use]
    pub fn new(entries: Vec<DriveStatusEntry>) -> Self {
        Self {
            taken_at: Utc::now(),
            entries,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[DriveStatusEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// First entry whose device node equals `device_node`.
    #[must_use]
    pub fn find_by_device(&self, device_node: &str) -> Option<&DriveStatusEntry> {
        self.entries.iter().find(|e| e.device_node == device_node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split one output line on commas that are not inside quotes.
///
/// Quote characters are dropped from the result, so no field ever
/// contains a literal `"`.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse the full stdout of the status tool.
///
/// Rows whose first field is not a drive record, or whose connection
/// status is [`NO_DRIVE_SENTINEL`], are skipped. Drive rows that are too
/// short to carry a device node are rejected.
pub fn parse_status_output(output: &str, table: &MediaStateTable) -> Result<Vec<DriveStatusEntry>> {
    let mut entries = Vec::new();

    for (lineno, line) in output.lines().enumerate() {
        let fields = split_record(line.trim());

        if !DRIVE_RECORD.is_match(&fields[0]) {
            continue;
        }
        if fields.get(1).is_some_and(|f| f == NO_DRIVE_SENTINEL) {
            trace!(line = lineno + 1, "Skipping empty drive slot");
            continue;
        }
        if fields.len() < DRIVE_ROW_FIELDS {
            return Err(RipError::StatusParse(format!(
                "line {}: drive record has {} fields, expected at least {DRIVE_ROW_FIELDS}",
                lineno + 1,
                fields.len()
            )));
        }

        let media = table.lookup(&fields[1], &fields[3]);
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        entries.push(DriveStatusEntry {
            index: next(),
            visible: next(),
            enabled: next(),
            state: next(),
            name: next(),
            label: next(),
            device_node: next(),
            media,
        });
    }

    Ok(entries)
}

/// Reads drive status by running `makemkvcon` (or a compatible program).
#[derive(Debug, Clone)]
pub struct MakemkvStatusReader {
    program: String,
    args: Vec<String>,
    table: MediaStateTable,
}

impl MakemkvStatusReader {
    /// Default arguments requesting cached disc info for all drives.
    pub const DEFAULT_ARGS: [&'static str; 4] = ["-r", "--cache=1", "info", "disc:"];

    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            table: MediaStateTable::default(),
        }
    }

    /// Reader for the configured status program and arguments.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.tools.makemkvcon, settings.tools.status_args.clone())
    }

    #[must_use]
    pub fn with_table(mut self, table: MediaStateTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        Path::new(&self.program)
    }
}

impl DriveStatusReader for MakemkvStatusReader {
    #[instrument(skip(self), fields(tool = %self.program))]
    fn snapshot(&self) -> Result<DriveSnapshot> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| RipError::StatusQuery {
                tool: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            // makemkvcon exits non-zero in several benign situations; the
            // drive rows are still printed.
            debug!(status = %output.status, "Status tool exited unsuccessfully");
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| RipError::StatusParse(format!("output is not UTF-8: {e}")))?;

        let entries = parse_status_output(&stdout, &self.table)?;
        if entries.is_empty() {
            warn!("Status tool reported no drives");
        }
        debug!(drives = entries.len(), "Drive status snapshot taken");
        Ok(DriveSnapshot::new(entries))
    }
}
