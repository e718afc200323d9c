//! autoripper - watches optical drives and rips inserted media.
//!
//! Runs as a foreground daemon by default; the other subcommands inspect
//! drives or run a single cycle by hand.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};

use clap::Parser;
use console::style;
use serde::Serialize;
use tracing::info;

use autoripper::cli::{Cli, Commands, CompletionsArgs, RipArgs, WatchArgs};
use autoripper::config::{Settings, load_settings, settings_path};
use autoripper::dispatch::{DispatchReport, Dispatcher, RipDispatcher};
use autoripper::drive::{DriveStatusReader, MakemkvStatusReader, discover_drives};
use autoripper::error::{Result, RipError};
use autoripper::event_loop::EventLoop;
use autoripper::events::{DeviceCache, RawDeviceEvent, UdevEventSource};
use autoripper::logging::{FileSink, init_logging};
use autoripper::reconcile::{Reconciler, Reconciliation};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    if cli.no_color || !io::stderr().is_terminal() {
        console::set_colors_enabled_stderr(false);
    }

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => cmd_watch(cli, &WatchArgs::default()),
        Some(Commands::Watch(args)) => cmd_watch(cli, args),
        Some(Commands::Status) => cmd_status(cli),
        Some(Commands::Drives) => cmd_drives(cli),
        Some(Commands::Rip(args)) => cmd_rip(cli, args),
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

fn load(cli: &Cli) -> Result<Settings> {
    load_settings(settings_path(cli.config.as_deref()))
}

fn init_console_logging(cli: &Cli) -> Result<()> {
    init_logging(cli.use_json(), cli.verbose, cli.quiet, cli.no_color, None)?;
    Ok(())
}

// === Daemon ===

fn cmd_watch(cli: &Cli, args: &WatchArgs) -> Result<()> {
    let settings = load(cli)?;
    let sink = (!args.no_log_file).then(|| FileSink::from_settings(&settings));
    let _guard = init_logging(cli.use_json(), cli.verbose, cli.quiet, cli.no_color, sink.as_ref())?;

    info!(
        version = build_info::VERSION,
        destination = %settings.destination_dir.display(),
        "Starting autoripper"
    );
    discover_drives()?;

    let mut event_loop = EventLoop::new(
        Reconciler::new(&settings.destination_dir),
        MakemkvStatusReader::from_settings(&settings),
        RipDispatcher::from_settings(&settings),
    );
    let source = UdevEventSource::open()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop.run(source))?;

    info!("autoripper stopped");
    Ok(())
}

// === Inspection ===

fn cmd_status(cli: &Cli) -> Result<()> {
    let settings = load(cli)?;
    init_console_logging(cli)?;

    let snapshot = MakemkvStatusReader::from_settings(&settings).snapshot()?;

    if cli.use_json() {
        output_json(cli, &snapshot);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("{}", style("No drives reported").yellow());
        return Ok(());
    }

    let header = format!(
        "{:<8} {:<12} {:<8} {:<24} {}",
        "INDEX", "DEVICE", "MEDIA", "NAME", "LABEL"
    );
    println!("{}", style(header).bold());
    for entry in snapshot.entries() {
        println!(
            "{:<8} {:<12} {} {:<24} {}",
            entry.index,
            entry.device_node,
            style(format!("{:<8}", entry.media.as_str())).cyan(),
            entry.name,
            entry.label
        );
    }
    Ok(())
}

fn cmd_drives(cli: &Cli) -> Result<()> {
    init_console_logging(cli)?;
    let drives = discover_drives()?;

    if cli.use_json() {
        output_json(cli, &drives);
        return Ok(());
    }

    for drive in &drives {
        println!(
            "{}  {}",
            style(drive.device_node.display()).green(),
            drive.model.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

// === Single cycle ===

#[derive(Serialize)]
struct RipOutcome {
    device: String,
    dry_run: bool,
    reconciliation: Reconciliation,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<DispatchReport>,
}

fn cmd_rip(cli: &Cli, args: &RipArgs) -> Result<()> {
    let settings = load(cli)?;
    init_console_logging(cli)?;

    let reader = MakemkvStatusReader::from_settings(&settings);
    let reconciler = Reconciler::new(&settings.destination_dir);
    let event = RawDeviceEvent::synthetic_change(&args.device);
    let reconciliation = reconciler.reconcile(&event, &mut DeviceCache::new(), &reader)?;

    let report = match (&reconciliation, args.dry_run) {
        (Reconciliation::Dispatch(decision), false) => {
            Some(RipDispatcher::from_settings(&settings).dispatch(decision)?)
        }
        _ => None,
    };

    let outcome = RipOutcome {
        device: args.device.clone(),
        dry_run: args.dry_run,
        reconciliation,
        report,
    };

    if cli.use_json() {
        output_json(cli, &outcome);
    } else {
        print_rip_outcome(&outcome);
    }
    Ok(())
}

fn print_rip_outcome(outcome: &RipOutcome) {
    match &outcome.reconciliation {
        Reconciliation::Dispatch(decision) => {
            let verb = if outcome.dry_run { "Would rip" } else { "Ripped" };
            println!(
                "{} {} ({}) to {}",
                style(verb).green().bold(),
                outcome.device,
                decision.media,
                decision.output_path.display()
            );
        }
        Reconciliation::Skip(reason) => {
            println!("{} {}: {reason:?}", style("Skipped").yellow().bold(), outcome.device);
        }
    }
    if let Some(report) = &outcome.report {
        if let Some(code) = report.exit_code {
            println!("exit status: {code}");
        }
        if report.ejected {
            println!("media ejected");
        }
    }
}

// === Utilities ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("autoripper {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "autoripper", &mut io::stdout());
    Ok(())
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{}: {e}", style("Error").red().bold()),
    }
}

fn output_error(cli: &Cli, error: &RipError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "fatal": error.is_fatal(),
        });
        eprintln!("{json}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}

