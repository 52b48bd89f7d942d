//! Platform checks.

/// Whether the current process runs with superuser privileges.
///
/// Uses the effective UID, so `su -c` and setuid wrappers both count.
#[cfg(unix)]
#[must_use]
pub fn is_superuser() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
#[must_use]
pub fn is_superuser() -> bool {
    false
}
