//! Resolve, download, verify and atomically install the artifact.

use crate::config::InstallerConfig;
use crate::constants::ARTIFACT_MODE;
use crate::core::IrisError;
use crate::upgrade::download::{ArtifactDownloader, HttpDownloader, build_http_client};
use crate::upgrade::release::{GithubReleaseResolver, ReleaseInfo, ReleaseResolver};
use crate::upgrade::verification::DigestVerifier;
use crate::utils::fs::atomic_write_with_mode;
use anyhow::{Context, Result};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stages of a single install run. There is no retry; a failure in any
/// stage ends the run and leaves the installed artifact as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Resolving,
    Downloading,
    Verifying,
    Replacing,
    Done,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Replacing => "replacing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What the supervisor needs from an installer.
pub trait ArtifactInstaller {
    /// Whether an artifact is present at the install path.
    fn is_installed(&self) -> bool;

    /// Install the latest release, replacing any existing artifact.
    fn install(&self) -> impl Future<Output = Result<ReleaseInfo>> + Send;
}

/// Install pipeline over a resolver and a downloader.
///
/// # Guarantees
///
/// - Nothing touches the install path before the download is verified
/// - The install path either keeps its previous content or holds the
///   complete new content with mode `0o555`
/// - The parent directory is never created; it must already exist
pub struct Installer<R, D> {
    resolver: R,
    downloader: D,
    artifact_path: PathBuf,
    artifact_name: String,
}

impl<R, D> Installer<R, D> {
    pub fn new(
        resolver: R,
        downloader: D,
        artifact_path: impl Into<PathBuf>,
        artifact_name: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            downloader,
            artifact_path: artifact_path.into(),
            artifact_name: artifact_name.into(),
        }
    }

    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    fn enter(&self, stage: InstallStage) {
        debug!("Install of {}: {}", self.artifact_name, stage);
    }
}

impl Installer<GithubReleaseResolver, HttpDownloader> {
    /// Installer talking to the configured release endpoint over HTTP.
    pub fn from_config(config: &InstallerConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let resolver =
            GithubReleaseResolver::new(client.clone(), &config.release_url, &config.artifact_name);
        let downloader = HttpDownloader::new(client, &config.artifact_name);

        Ok(Self::new(
            resolver,
            downloader,
            config.artifact_path.clone(),
            config.artifact_name.clone(),
        ))
    }
}

impl<R, D> ArtifactInstaller for Installer<R, D>
where
    R: ReleaseResolver + Sync,
    D: ArtifactDownloader + Sync,
{
    fn is_installed(&self) -> bool {
        std::fs::metadata(&self.artifact_path).is_ok()
    }

    async fn install(&self) -> Result<ReleaseInfo> {
        self.enter(InstallStage::Resolving);
        let release =
            self.resolver.resolve_latest().await.context("Failed to resolve the latest release")?;

        self.enter(InstallStage::Downloading);
        let data = self
            .downloader
            .download(&release.artifact_url)
            .await
            .with_context(|| format!("Failed to download {}", self.artifact_name))?;

        if data.is_empty() {
            return Err(IrisError::EmptyArtifact {
                url: release.artifact_url.clone(),
            })
            .with_context(|| format!("Failed to download {}", self.artifact_name));
        }

        self.enter(InstallStage::Verifying);
        DigestVerifier::ensure_matches(&data, &release.digest)
            .with_context(|| format!("Failed to verify {}", self.artifact_name))?;

        self.enter(InstallStage::Replacing);
        let path = self.artifact_path.clone();
        let size = data.len();
        tokio::task::spawn_blocking(move || {
            atomic_write_with_mode(&path, &data, Some(ARTIFACT_MODE)).map_err(|e| IrisError::Write {
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            })
        })
        .await
        .context("Install task panicked")??;

        self.enter(InstallStage::Done);
        info!(
            "Installed {} ({} bytes) to {}",
            release.display_name,
            size,
            self.artifact_path.display()
        );
        Ok(release)
    }
}
