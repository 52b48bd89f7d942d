//! Utility modules shared by the install pipeline and the supervisor.

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::atomic_write_with_mode;
pub use platform::is_superuser;
pub use progress::ProgressBar;
