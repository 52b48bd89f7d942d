//! Host lookups pinned to a single nameserver.
//!
//! The HTTP client normally asks the platform resolver. Device builds
//! without a working one still reach GitHub through [`PinnedResolver`],
//! which sends every query to the configured server directly.

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolver configuration that queries only `server`, over UDP first and
/// TCP for truncated answers.
#[must_use]
pub fn pinned_config(server: SocketAddr) -> ResolverConfig {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(server, Protocol::Udp));
    config.add_name_server(NameServerConfig::new(server, Protocol::Tcp));
    config
}

/// [`reqwest::dns::Resolve`] backed by a hickory resolver with one server.
#[derive(Clone)]
pub struct PinnedResolver {
    server: SocketAddr,
    inner: Arc<TokioAsyncResolver>,
}

impl PinnedResolver {
    /// `timeout` bounds each query attempt.
    #[must_use]
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;

        Self {
            server,
            inner: Arc::new(TokioAsyncResolver::tokio(pinned_config(server), opts)),
        }
    }

    #[must_use]
    pub const fn server(&self) -> SocketAddr {
        self.server
    }
}

impl Resolve for PinnedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.inner);
        let server = self.server;

        Box::pin(async move {
            debug!("Resolving {} via {}", name.as_str(), server);
            let lookup = resolver.lookup_ip(name.as_str()).await?;

            // reqwest fills in the port of the request URL
            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}
