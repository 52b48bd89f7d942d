//! OS process table access: enumeration by `ps`, termination by signal.

use crate::core::IrisError;
use anyhow::Result;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// One row of the process table. May be stale as soon as it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub name: String,
    pub pid: i32,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>, pid: i32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

/// Access to the OS process table.
pub trait ProcessTable {
    /// Snapshot every process as a name/PID pair.
    fn list(&self) -> impl Future<Output = Result<Vec<ProcessRecord>>> + Send;

    /// Forcefully terminate `pid`.
    fn terminate(&self, pid: i32) -> Result<(), IrisError>;
}

/// [`ProcessTable`] backed by `ps -eo name,pid` and `SIGKILL`.
pub struct PsProcessTable {
    timeout: Duration,
}

impl PsProcessTable {
    /// `timeout` bounds how long `ps` may run.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ProcessTable for PsProcessTable {
    async fn list(&self) -> Result<Vec<ProcessRecord>> {
        let mut cmd = Command::new("ps");
        cmd.args(["-eo", "name,pid"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| IrisError::ProcessEnumeration {
                reason: format!("ps did not finish within {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| IrisError::ProcessEnumeration {
                reason: format!("failed to run ps: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IrisError::ProcessEnumeration {
                reason: format!("ps exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        let records = parse_ps_output(&String::from_utf8_lossy(&output.stdout));
        debug!("Process table has {} entries", records.len());
        Ok(records)
    }

    fn terminate(&self, pid: i32) -> Result<(), IrisError> {
        send_sigkill(pid)
    }
}

#[cfg(unix)]
fn send_sigkill(pid: i32) -> Result<(), IrisError> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    debug!("Sending SIGKILL to process {}", pid);
    kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(|errno| IrisError::ProcessTermination {
        pid,
        reason: errno.desc().to_string(),
    })
}

#[cfg(not(unix))]
fn send_sigkill(pid: i32) -> Result<(), IrisError> {
    Err(IrisError::ProcessTermination {
        pid,
        reason: "signals are not supported on this platform".to_string(),
    })
}

/// Parse `ps -eo name,pid` output.
///
/// The first line is the header. Lines that do not split into exactly two
/// whitespace-separated fields, or whose second field is not a PID, are
/// skipped. Non-positive PIDs are dropped because `kill` would treat them as
/// process groups.
#[must_use]
pub fn parse_ps_output(output: &str) -> Vec<ProcessRecord> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let pid = fields.next()?;
            if fields.next().is_some() {
                return None;
            }
            let pid: i32 = pid.parse().ok()?;
            (pid > 0).then(|| ProcessRecord::new(name, pid))
        })
        .collect()
}
