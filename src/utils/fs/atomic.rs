//! Atomic file write operations using temp-and-rename strategy.
//!
//! The target path either keeps its previous content or holds the complete
//! new content; a crash mid-write leaves at most a stray `.tmp` sibling.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sibling path used while writing `path`.
///
/// The temp file sits in the same directory so the final rename never
/// crosses a filesystem boundary.
#[must_use]
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically write `content` to `path`.
///
/// # Process
///
/// 1. Remove any stale temp file from an earlier interrupted write
/// 2. Write and fsync the temp file
/// 3. Apply `mode` to the temp file (Unix only)
/// 4. Rename the temp file over `path`
///
/// The rename replaces a read-only target as long as the directory is
/// writable, so a previously installed `0o555` artifact is no obstacle.
pub fn atomic_write_with_mode(path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
    let temp_path = temp_path_for(path);

    // A leftover temp file may be read-only
    if temp_path.exists() {
        debug!("Removing stale temp file {}", temp_path.display());
        let _ = fs::remove_file(&temp_path);
    }

    {
        let mut file = fs::File::create(&temp_path).with_context(|| {
            format!(
                "Failed to create temp file: {}\n\nCheck file permissions and that directory exists",
                temp_path.display()
            )
        })?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    if let Some(mode) = mode {
        set_mode(&temp_path, mode).with_context(|| {
            format!("Failed to set mode {mode:o} on temp file: {}", temp_path.display())
        })?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to rename temp file to: {}", path.display()));
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
