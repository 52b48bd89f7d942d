//! Latest-release resolution against the GitHub releases API.

use crate::core::IrisError;
use crate::upgrade::download::network_error;
use anyhow::Result;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, info};

/// What the installer needs to know about the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Human-readable release name, shown to the user.
    pub display_name: String,
    /// Where the artifact can be downloaded.
    pub artifact_url: String,
    /// Declared content digest, `"<algorithm>:<hex>"`.
    pub digest: String,
}

/// Subset of a GitHub release document.
#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

/// Subset of a GitHub release asset.
#[derive(Debug, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    /// Absent on releases published before GitHub started exposing digests.
    #[serde(default)]
    pub digest: Option<String>,
    pub browser_download_url: String,
}

/// Parse a release document fetched from `url`.
pub fn parse_release(url: &str, body: &str) -> Result<GithubRelease, IrisError> {
    serde_json::from_str(body).map_err(|e| IrisError::MalformedResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Pick the first asset named exactly `artifact_name`.
///
/// An asset without a digest yields an empty digest string, which the
/// verifier rejects as an unsupported format instead of installing
/// unverified bytes.
pub fn select_artifact(release: &GithubRelease, artifact_name: &str) -> Result<ReleaseInfo, IrisError> {
    let asset = release.assets.iter().find(|asset| asset.name == artifact_name).ok_or_else(|| {
        IrisError::ArtifactNotFound {
            name: artifact_name.to_string(),
        }
    })?;

    let display_name = release
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .or(release.tag_name.as_deref())
        .unwrap_or(artifact_name)
        .to_string();

    Ok(ReleaseInfo {
        display_name,
        artifact_url: asset.browser_download_url.clone(),
        digest: asset.digest.clone().unwrap_or_default(),
    })
}

/// Source of the latest release.
pub trait ReleaseResolver {
    /// Resolve the latest release and its artifact.
    ///
    /// # Errors
    ///
    /// The typed root cause is one of [`IrisError::Network`],
    /// [`IrisError::UnexpectedStatus`], [`IrisError::MalformedResponse`] or
    /// [`IrisError::ArtifactNotFound`].
    fn resolve_latest(&self) -> impl Future<Output = Result<ReleaseInfo>> + Send;
}

/// [`ReleaseResolver`] backed by a `releases/latest` API endpoint.
pub struct GithubReleaseResolver {
    client: reqwest::Client,
    url: String,
    artifact_name: String,
}

impl GithubReleaseResolver {
    pub fn new(client: reqwest::Client, url: impl Into<String>, artifact_name: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            artifact_name: artifact_name.into(),
        }
    }
}

impl ReleaseResolver for GithubReleaseResolver {
    async fn resolve_latest(&self) -> Result<ReleaseInfo> {
        debug!("Fetching latest release from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| network_error(&self.url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IrisError::UnexpectedStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| network_error(&self.url, &e))?;
        let release = parse_release(&self.url, &body)?;
        let info = select_artifact(&release, &self.artifact_name)?;

        info!("Latest release: {} ({})", info.display_name, info.artifact_url);
        Ok(info)
    }
}
