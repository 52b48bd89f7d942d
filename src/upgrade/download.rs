//! HTTP transport for release metadata and artifact downloads.

use crate::config::InstallerConfig;
use crate::core::IrisError;
use crate::upgrade::dns::PinnedResolver;
use crate::utils::ProgressBar;
use anyhow::{Context, Result};
use std::error::Error as _;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Build the HTTP client shared by the resolver and the downloader.
///
/// Connect and read timeouts both come from
/// [`InstallerConfig::http_timeout`]; there is deliberately no overall
/// request timeout so that large artifacts on slow links are not cut off
/// while bytes are still arriving.
///
/// With [`InstallerConfig::dns_server`] set, host lookups bypass the
/// platform resolver and go to that server.
pub fn build_http_client(config: &InstallerConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.http_timeout())
        .read_timeout(config.http_timeout())
        .user_agent(USER_AGENT);

    if let Some(server) = config.dns_server {
        debug!("Resolving hosts via {}", server);
        builder = builder.dns_resolver(Arc::new(PinnedResolver::new(server, config.http_timeout())));
    }

    builder.build().context("Failed to build HTTP client")
}

const USER_AGENT: &str = concat!("iris-installer/", env!("CARGO_PKG_VERSION"));

/// Describe a transport error including its source chain.
///
/// `reqwest::Error`'s own message is usually just "error sending request";
/// the interesting part (DNS, refused, timed out) sits in its sources.
pub(crate) fn network_error(url: &str, error: &reqwest::Error) -> IrisError {
    let mut reason = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }

    IrisError::Network {
        url: url.to_string(),
        reason,
    }
}

/// Fetches artifact bytes from a URL.
pub trait ArtifactDownloader {
    /// Download the complete body behind `url`.
    ///
    /// An empty body is returned as-is; rejecting it is the installer's call.
    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// [`ArtifactDownloader`] performing a single HTTP GET.
pub struct HttpDownloader {
    client: reqwest::Client,
    label: String,
}

impl HttpDownloader {
    /// `label` prefixes the progress bar (usually the artifact name).
    pub fn new(client: reqwest::Client, label: impl Into<String>) -> Self {
        Self {
            client,
            label: label.into(),
        }
    }
}

impl ArtifactDownloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Downloading artifact from {}", url);

        let mut response =
            self.client.get(url).send().await.map_err(|e| network_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IrisError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let total = response.content_length();
        let progress = ProgressBar::new_download(self.label.clone(), total);
        let mut data = Vec::new();

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    progress.inc(chunk.len() as u64);
                    data.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    progress.finish_and_clear();
                    return Err(network_error(url, &e).into());
                }
            }
        }
        progress.finish_and_clear();

        info!("Downloaded {} bytes from {}", data.len(), url);
        Ok(data)
    }
}
