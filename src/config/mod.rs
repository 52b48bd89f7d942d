//! Installer configuration.
//!
//! Every fixed value the installer depends on (install path, process name,
//! release endpoint, launch parameters) lives in [`InstallerConfig`] and is
//! injected into the [`Installer`](crate::upgrade::Installer) and the
//! [`Supervisor`](crate::process::Supervisor). The defaults describe the real
//! Iris deployment, so a device needs no configuration file at all.
//!
//! # Overriding
//!
//! Set `IRIS_INSTALLER_CONFIG` to the path of a TOML file. Missing keys keep
//! their defaults; unknown keys are rejected.
//!
//! ```toml
//! artifact_path = "/data/local/tmp/Iris.apk"
//! process_name = "dolidolih_iris"
//! http_timeout_secs = 20
//! dns_server = "1.1.1.1:53"  # "" falls back to the system resolver
//! ```

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_APP_PROCESS, DEFAULT_ARTIFACT_NAME, DEFAULT_ARTIFACT_PATH,
    DEFAULT_DNS_SERVER, DEFAULT_HTTP_TIMEOUT, DEFAULT_MAIN_CLASS, DEFAULT_PROCESS_NAME, DEFAULT_RELEASE_URL,
};
use crate::core::IrisError;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Settings for the install pipeline and the process supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    /// Absolute path the verified artifact is installed to.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Asset name to select from the latest release.
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,

    /// Well-known process name used both as the launch nicename and to find
    /// running instances.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Latest-release metadata endpoint.
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Main class handed to `app_process`.
    #[serde(default = "default_main_class")]
    pub main_class: String,

    /// Program used to execute the artifact.
    #[serde(default = "default_app_process")]
    pub app_process: String,

    /// Connect and read timeout for HTTP requests, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Nameserver used for every HTTP host lookup, over UDP with TCP
    /// fallback. `None` uses the platform resolver.
    #[serde(default = "default_dns_server", deserialize_with = "deserialize_dns_server")]
    pub dns_server: Option<SocketAddr>,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

fn default_artifact_name() -> String {
    DEFAULT_ARTIFACT_NAME.to_string()
}

fn default_process_name() -> String {
    DEFAULT_PROCESS_NAME.to_string()
}

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

fn default_main_class() -> String {
    DEFAULT_MAIN_CLASS.to_string()
}

fn default_app_process() -> String {
    DEFAULT_APP_PROCESS.to_string()
}

const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

const fn default_dns_server() -> Option<SocketAddr> {
    Some(DEFAULT_DNS_SERVER)
}

/// TOML has no null, so an empty string turns the pinned server off.
fn deserialize_dns_server<'de, D>(deserializer: D) -> std::result::Result<Option<SocketAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.trim().is_empty() {
        return Ok(None);
    }
    value.trim().parse().map(Some).map_err(serde::de::Error::custom)
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            artifact_name: default_artifact_name(),
            process_name: default_process_name(),
            release_url: default_release_url(),
            main_class: default_main_class(),
            app_process: default_app_process(),
            http_timeout_secs: default_http_timeout_secs(),
            dns_server: default_dns_server(),
        }
    }
}

impl InstallerConfig {
    /// Load the configuration named by `IRIS_INSTALLER_CONFIG`, or the defaults.
    ///
    /// A variable pointing at a file that does not exist is not an error; the
    /// defaults are used, matching how a device without any configuration
    /// behaves.
    pub async fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_with_optional(Some(PathBuf::from(path))).await,
            None => Ok(Self::default()),
        }
    }

    /// Load from `path` when given and present, otherwise return the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(&path).await,
            Some(path) => {
                debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML configuration file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|e| IrisError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = toml::from_str(&content).map_err(|e| IrisError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
