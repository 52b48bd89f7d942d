//! Fixed values describing the managed application.
//!
//! These are the defaults behind [`InstallerConfig`](crate::config::InstallerConfig);
//! code paths read them through the configuration rather than directly so
//! tests can point the installer and supervisor at temporary locations.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Where the verified artifact is installed on the device.
pub const DEFAULT_ARTIFACT_PATH: &str = "/data/local/tmp/Iris.apk";

/// Asset name selected from the latest release.
pub const DEFAULT_ARTIFACT_NAME: &str = "Iris.apk";

/// Nicename the managed process is launched with and later found by.
pub const DEFAULT_PROCESS_NAME: &str = "dolidolih_iris";

/// GitHub API endpoint describing the latest published release.
pub const DEFAULT_RELEASE_URL: &str = "https://api.github.com/repos/dolidolih/iris/releases/latest";

/// Entry class passed to `app_process`.
pub const DEFAULT_MAIN_CLASS: &str = "party.qwer.iris.Main";

/// Android's native process-execution entry point.
pub const DEFAULT_APP_PROCESS: &str = "app_process";

/// Connect and read timeout for every HTTP request (10 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Nameserver every HTTP host is resolved through (Google public DNS).
///
/// Some device builds ship without a usable system resolver, so lookups go
/// straight to a known server instead.
pub const DEFAULT_DNS_SERVER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);

/// Mode bits of the installed artifact: read and execute for everyone, no write.
pub const ARTIFACT_MODE: u32 = 0o555;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_ENV_VAR: &str = "IRIS_INSTALLER_CONFIG";

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV_VAR: &str = "IRIS_INSTALLER_NO_PROGRESS";
