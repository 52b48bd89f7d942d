//! Start, stop and liveness checks for the managed process.

use crate::process::launcher::{LaunchMode, Launcher};
use crate::process::table::{ProcessRecord, ProcessTable};
use crate::upgrade::{ArtifactInstaller, ReleaseInfo};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Progress notifications emitted while a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// No artifact was found and an install is starting.
    InstallStarted,
    Installed(ReleaseInfo),
    Terminated { pid: i32 },
    /// A matching process could not be terminated; the sweep went on.
    TerminationSkipped { pid: i32, reason: String },
    Launching(LaunchMode),
    Launched(LaunchMode),
}

/// Callback receiving [`SupervisorEvent`]s.
pub type EventReporter = Box<dyn Fn(&SupervisorEvent) + Send + Sync>;

/// Outcome of a kill sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub terminated: Vec<i32>,
    pub skipped: Vec<(i32, String)>,
}

/// Controls the single managed instance.
///
/// Instances are identified purely by process name, never by a remembered
/// PID. Any unrelated process that happens to share the name is treated as
/// an instance and will be killed by [`stop`](Self::stop) and
/// [`start`](Self::start).
pub struct Supervisor<I, T, L> {
    installer: I,
    table: T,
    launcher: L,
    process_name: String,
    reporter: EventReporter,
}

impl<I, T, L> Supervisor<I, T, L>
where
    I: ArtifactInstaller,
    T: ProcessTable,
    L: Launcher,
{
    pub fn new(installer: I, table: T, launcher: L, process_name: impl Into<String>) -> Self {
        Self {
            installer,
            table,
            launcher,
            process_name: process_name.into(),
            reporter: Box::new(|_| {}),
        }
    }

    /// Route progress events to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Fn(&SupervisorEvent) + Send + Sync + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    fn emit(&self, event: SupervisorEvent) {
        (self.reporter)(&event);
    }

    /// Install if needed, stop running instances, then launch one.
    ///
    /// An install failure aborts before anything is killed or launched.
    pub async fn start(&self, mode: LaunchMode) -> Result<()> {
        if !self.installer.is_installed() {
            self.emit(SupervisorEvent::InstallStarted);
            let release = self.installer.install().await.context("Failed to install Iris")?;
            self.emit(SupervisorEvent::Installed(release));
        }

        self.kill_sweep().await.context("Failed to stop running Iris instances")?;

        self.emit(SupervisorEvent::Launching(mode));
        self.launcher.launch(mode).await.context("Failed to start Iris")?;
        self.emit(SupervisorEvent::Launched(mode));
        Ok(())
    }

    /// Stop every running instance.
    pub async fn stop(&self) -> Result<SweepReport> {
        self.kill_sweep().await.context("Failed to stop running Iris instances")
    }

    /// Running instances. Empty when not running.
    pub async fn check(&self) -> Result<Vec<ProcessRecord>> {
        self.find_instances().await.context("Failed to check whether Iris is running")
    }

    async fn find_instances(&self) -> Result<Vec<ProcessRecord>> {
        let records = self.table.list().await?;
        let instances: Vec<_> =
            records.into_iter().filter(|record| record.name == self.process_name).collect();

        debug!("Found {} process(es) named {}", instances.len(), self.process_name);
        Ok(instances)
    }

    /// Terminate every instance, tolerating per-process failures.
    ///
    /// Only enumeration failure is an error. A PID that fails to die (already
    /// exited, permission denied) is logged and skipped.
    pub async fn kill_sweep(&self) -> Result<SweepReport> {
        let instances = self.find_instances().await?;
        let mut report = SweepReport::default();

        if instances.len() > 1 {
            warn!(
                "{} processes are named {}; all of them will be terminated",
                instances.len(),
                self.process_name
            );
        }

        for instance in instances {
            match self.table.terminate(instance.pid) {
                Ok(()) => {
                    info!("Terminated {} ({})", instance.name, instance.pid);
                    self.emit(SupervisorEvent::Terminated { pid: instance.pid });
                    report.terminated.push(instance.pid);
                }
                Err(e) => {
                    warn!("Skipping process {}: {}", instance.pid, e);
                    self.emit(SupervisorEvent::TerminationSkipped {
                        pid: instance.pid,
                        reason: e.to_string(),
                    });
                    report.skipped.push((instance.pid, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
