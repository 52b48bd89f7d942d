//! Integrity-verified install pipeline for the Iris artifact.
//!
//! # Components
//!
//! - **[`ReleaseResolver`]**: finds the artifact URL, digest and display name
//!   of the latest release ([`GithubReleaseResolver`] in production)
//! - **[`ArtifactDownloader`]**: fetches the artifact bytes ([`HttpDownloader`])
//! - **[`DigestVerifier`]**: checks the bytes against the published digest
//! - **[`Installer`]**: runs the stages in order and atomically replaces the
//!   artifact on disk
//!
//! ## Install Flow
//!
//! ```text
//! Resolving ── latest release metadata, first asset named like the artifact
//!     │
//! Downloading ── single GET, empty body rejected
//!     │
//! Verifying ── sha256 over the bytes, nothing written on mismatch
//!     │
//! Replacing ── write <path>.tmp with mode 0o555, rename over <path>
//!     │
//! Done
//! ```
//!
//! Any failure ends the run; the previously installed artifact, if any, is
//! left untouched. There are no retries and no rollback.
//!
//! # Examples
//!
//! ```rust,no_run
//! use iris_installer::config::InstallerConfig;
//! use iris_installer::upgrade::{ArtifactInstaller, Installer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = InstallerConfig::default();
//! let installer = Installer::from_config(&config)?;
//! let release = installer.install().await?;
//! println!("Installed {}", release.display_name);
//! # Ok(())
//! # }
//! ```

pub mod dns;
pub mod download;
pub mod installer;
pub mod release;
pub mod verification;

pub use dns::PinnedResolver;
pub use download::{ArtifactDownloader, HttpDownloader, build_http_client};
pub use installer::{ArtifactInstaller, InstallStage, Installer};
pub use release::{GithubReleaseResolver, ReleaseInfo, ReleaseResolver};
pub use verification::DigestVerifier;
