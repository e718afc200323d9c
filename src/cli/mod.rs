//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Watches optical drives and rips whatever gets inserted.
///
/// Audio CDs go through whipper; DVDs and Blu-rays through makemkvcon.
/// Without a subcommand the daemon runs in the foreground.
#[derive(Parser, Debug)]
#[command(name = "autoripper", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Settings file (TOML, YAML, or legacy key=value); falls back to $RIPPER_SETTINGS
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "AUTORIPPER_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json, with JSON log lines
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch for media changes and rip (the default)
    Watch(WatchArgs),

    /// Show the drive status table once
    Status,

    /// List optical drives known to udev
    Drives,

    /// Reconcile one drive now, as if its media had just changed
    Rip(RipArgs),

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug, Default)]
pub struct WatchArgs {
    /// Log to the console only, without the log file
    #[arg(long)]
    pub no_log_file: bool,
}

#[derive(Parser, Debug)]
pub struct RipArgs {
    /// Device node, e.g. /dev/sr0
    pub device: String,

    /// Print the decision without running any tool
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
