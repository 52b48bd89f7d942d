//! Command-line interface for the Iris installer.
//!
//! The surface is a single positional subcommand with no flags:
//!
//! - `start` - install if needed, stop running instances, start in the background
//! - `start-fg` - same, but run in the foreground and wait for exit
//! - `stop` - stop every running instance
//! - `update` - install the latest release
//! - `check` - report whether Iris is running
//! - `help` - print usage
//!
//! Running without a subcommand prints the help. An unrecognised subcommand
//! prints a message naming it. Anything after the subcommand is ignored.
//!
//! All user-facing output goes to standard output. Logs from `tracing` go to
//! standard error and are silent unless `RUST_LOG` asks for them.

use crate::config::InstallerConfig;
use crate::process::{
    AppProcessLauncher, LaunchMode, Launcher, ProcessTable, PsProcessTable, Supervisor,
    SupervisorEvent,
};
use crate::upgrade::{ArtifactInstaller, GithubReleaseResolver, HttpDownloader, Installer};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(
    name = "iris_installer",
    about = "Install, update and supervise Iris",
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Every subcommand the installer understands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start Iris in the background
    Start,
    /// Start Iris in the foreground
    #[command(name = "start-fg")]
    StartFg,
    /// Stop Iris
    Stop,
    /// Update Iris to the latest release
    Update,
    /// Check whether Iris is running
    Check,
}

/// What a command line asks for, resolved once at entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Commands),
    Help,
    Unknown(String),
}

impl Invocation {
    /// Resolve `args` (including the program name) into an invocation.
    ///
    /// `help` is answered here rather than in [`Commands`] because printing
    /// it needs the program name, which only the caller knows.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let Some(subcommand) = args.get(1).map(S::as_ref) else {
            return Self::Help;
        };
        if subcommand == "help" {
            return Self::Help;
        }

        // Only the subcommand itself is significant
        let significant = args.iter().take(2).map(S::as_ref);

        match Cli::try_parse_from(significant) {
            Ok(Cli { command: Some(command) }) => Self::Run(command),
            // clap swallows `--` and the like without naming a subcommand
            Ok(Cli { command: None }) | Err(_) => Self::Unknown(subcommand.to_string()),
        }
    }
}

/// Print usage, naming the program as it was invoked.
pub fn print_help(program: &str) {
    println!("{}", "Iris installer".bold());
    println!();
    println!("{} {} <command>", "Usage:".bold(), program);
    println!();
    println!("{}", "Commands:".bold());
    for (name, description) in [
        ("start", "Start Iris in the background"),
        ("start-fg", "Start Iris in the foreground"),
        ("stop", "Stop Iris"),
        ("check", "Check whether Iris is running"),
        ("update", "Update Iris to the latest release"),
        ("help", "Show this help"),
    ] {
        println!("  {} {:<9} {}", program, name.cyan(), description);
    }
}

/// Report an unrecognised subcommand.
pub fn print_unknown(command: &str, program: &str) {
    println!("{} {}", "Unknown command:".red(), command);
    println!("Run '{program} help' to see the available commands");
}

/// Supervisor wired to the real device collaborators.
pub type DeviceSupervisor =
    Supervisor<Installer<GithubReleaseResolver, HttpDownloader>, PsProcessTable, AppProcessLauncher>;

/// Build the device supervisor from `config`, printing its progress.
pub fn device_supervisor(config: &InstallerConfig) -> Result<DeviceSupervisor> {
    let supervisor = Supervisor::new(
        Installer::from_config(config)?,
        PsProcessTable::new(config.http_timeout()),
        AppProcessLauncher::from_config(config),
        config.process_name.clone(),
    );
    Ok(supervisor.with_reporter(print_event))
}

/// Load the configuration and run `command` against the device.
pub async fn execute(command: Commands) -> Result<()> {
    let config = InstallerConfig::load().await?;
    let supervisor = device_supervisor(&config)?;
    execute_with(command, &supervisor).await
}

/// Run `command` against an already assembled supervisor.
pub async fn execute_with<I, T, L>(command: Commands, supervisor: &Supervisor<I, T, L>) -> Result<()>
where
    I: ArtifactInstaller,
    T: ProcessTable,
    L: Launcher,
{
    match command {
        Commands::Start => supervisor.start(LaunchMode::Background).await,
        Commands::StartFg => supervisor.start(LaunchMode::Foreground).await,
        Commands::Stop => stop(supervisor).await,
        Commands::Update => update(supervisor).await,
        Commands::Check => check(supervisor).await,
    }
}

async fn stop<I, T, L>(supervisor: &Supervisor<I, T, L>) -> Result<()>
where
    I: ArtifactInstaller,
    T: ProcessTable,
    L: Launcher,
{
    println!("Stopping Iris...");
    let report = supervisor.stop().await?;

    if report.terminated.is_empty() && report.skipped.is_empty() {
        println!("Iris was not running");
    } else if report.skipped.is_empty() {
        println!("{} Iris stopped ({} terminated)", "✓".green(), report.terminated.len());
    } else {
        println!(
            "{} Iris stopped ({} terminated, {} skipped)",
            "!".yellow(),
            report.terminated.len(),
            report.skipped.len()
        );
    }
    Ok(())
}

async fn update<I, T, L>(supervisor: &Supervisor<I, T, L>) -> Result<()>
where
    I: ArtifactInstaller,
    T: ProcessTable,
    L: Launcher,
{
    println!("Updating Iris to the latest release...");
    let release = supervisor.installer().install().await?;
    println!("{} Installed {}", "✓".green(), release.display_name.bold());
    Ok(())
}

async fn check<I, T, L>(supervisor: &Supervisor<I, T, L>) -> Result<()>
where
    I: ArtifactInstaller,
    T: ProcessTable,
    L: Launcher,
{
    let instances = supervisor.check().await?;

    if instances.is_empty() {
        println!("Iris is not running");
    }
    for instance in instances {
        println!("Iris is running ({})", instance.pid.to_string().cyan());
    }
    Ok(())
}

/// Print a supervisor event as a progress line.
pub fn print_event(event: &SupervisorEvent) {
    match event {
        SupervisorEvent::InstallStarted => println!("Iris is not installed. Installing..."),
        SupervisorEvent::Installed(release) => {
            println!("{} Installed {}", "✓".green(), release.display_name.bold());
        }
        SupervisorEvent::Terminated { pid } => println!("Stopped Iris process ({pid})"),
        SupervisorEvent::TerminationSkipped { pid, reason } => {
            println!("{} Could not stop Iris process ({pid}): {reason}", "!".yellow());
        }
        SupervisorEvent::Launching(LaunchMode::Background) => println!("Starting Iris..."),
        SupervisorEvent::Launching(LaunchMode::Foreground) => {
            println!("Starting Iris in the foreground...");
        }
        SupervisorEvent::Launched(LaunchMode::Background) => {
            println!("{} Iris started", "✓".green());
        }
        SupervisorEvent::Launched(LaunchMode::Foreground) => println!("Iris exited"),
    }
}
