//! Iris installer and process supervisor for rooted Android devices.
//!
//! The crate does two things:
//!
//! 1. **Install** the Iris artifact: resolve the latest release, download it,
//!    verify its SHA-256 digest and atomically replace the file on disk
//!    ([`upgrade`])
//! 2. **Supervise** the running Iris process: find it by its well-known
//!    process name, kill it, and launch a fresh instance in the foreground
//!    or background ([`process`])
//!
//! `start` ties the two together: it installs when no artifact is present,
//! stops any running instance and launches exactly one new one.
//!
//! # Modules
//!
//! - [`cli`] - subcommand parsing and the per-command handlers
//! - [`config`] - [`InstallerConfig`](config::InstallerConfig), every fixed
//!   value the installer uses
//! - [`constants`] - defaults behind the configuration
//! - [`core`] - error types and user-facing error reports
//! - [`process`] - process table, launcher and supervisor
//! - [`upgrade`] - release resolution, download, verification and install
//! - [`utils`] - atomic writes, progress bars, privilege checks
//!
//! # Example
//!
//! ```rust,no_run
//! use iris_installer::cli::{Commands, execute};
//!
//! # async fn example() -> anyhow::Result<()> {
//! execute(Commands::Check).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod process;
pub mod upgrade;
pub mod utils;
