//! Supervision of the running Iris process.
//!
//! The [`Supervisor`] composes three collaborators:
//!
//! - an [`ArtifactInstaller`](crate::upgrade::ArtifactInstaller), consulted
//!   on `start` when no artifact is present
//! - a [`ProcessTable`] that lists processes and terminates them by PID
//!   ([`PsProcessTable`] on devices)
//! - a [`Launcher`] that spawns the artifact ([`AppProcessLauncher`])
//!
//! ```text
//! start:  [install if absent] -> kill sweep -> launch
//! stop:   kill sweep
//! check:  list processes named like the managed process
//! ```

pub mod launcher;
pub mod supervisor;
pub mod table;

pub use launcher::{AppProcessLauncher, LaunchMode, Launcher};
pub use supervisor::{EventReporter, Supervisor, SupervisorEvent, SweepReport};
pub use table::{ProcessRecord, ProcessTable, PsProcessTable, parse_ps_output};
