//! Launching the artifact through `app_process`.

use crate::config::InstallerConfig;
use crate::core::IrisError;
use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// How the managed process relates to the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Attached to the installer's stdio; the installer waits for it to exit.
    Foreground,
    /// Detached; the installer returns as soon as it is spawned.
    Background,
}

/// Starts one instance of the managed process.
pub trait Launcher {
    fn launch(&self, mode: LaunchMode) -> impl Future<Output = Result<()>> + Send;
}

/// [`Launcher`] running `app_process -cp <artifact> / --nice-name=<name> <main class>`.
pub struct AppProcessLauncher {
    program: String,
    artifact_path: PathBuf,
    process_name: String,
    main_class: String,
}

impl AppProcessLauncher {
    pub fn new(
        program: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
        process_name: impl Into<String>,
        main_class: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            artifact_path: artifact_path.into(),
            process_name: process_name.into(),
            main_class: main_class.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &InstallerConfig) -> Self {
        Self::new(
            config.app_process.clone(),
            config.artifact_path.clone(),
            config.process_name.clone(),
            config.main_class.clone(),
        )
    }

    /// Arguments passed to the program, in order.
    #[must_use]
    pub fn command_args(&self) -> Vec<String> {
        vec![
            "-cp".to_string(),
            self.artifact_path.display().to_string(),
            "/".to_string(),
            format!("--nice-name={}", self.process_name),
            self.main_class.clone(),
        ]
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.command_args());
        cmd
    }

    fn launch_error(&self, reason: impl Into<String>) -> IrisError {
        IrisError::Launch {
            command: self.program.clone(),
            reason: reason.into(),
        }
    }
}

impl Launcher for AppProcessLauncher {
    async fn launch(&self, mode: LaunchMode) -> Result<()> {
        let mut cmd = self.command();
        debug!("Launching {} {:?} ({:?})", self.program, self.command_args(), mode);

        match mode {
            LaunchMode::Foreground => {
                cmd.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());

                let status = cmd
                    .status()
                    .await
                    .map_err(|e| self.launch_error(format!("failed to spawn: {e}")))?;

                if !status.success() {
                    return Err(self.launch_error(format!("exited with {status}")).into());
                }
                info!("{} exited normally", self.process_name);
            }
            LaunchMode::Background => {
                cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
                // Own process group so the shell's hangup does not reach it
                #[cfg(unix)]
                cmd.process_group(0);

                let child =
                    cmd.spawn().map_err(|e| self.launch_error(format!("failed to spawn: {e}")))?;
                info!("Started {} in the background (pid {:?})", self.process_name, child.id());
            }
        }

        Ok(())
    }
}
