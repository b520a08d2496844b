use std::fmt;
use std::net::{IpAddr, SocketAddr};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::OnceCell;
use trust_dns_resolver::TokioAsyncResolver;

use crate::core::{Error, Result};

/// Turns the configured server name into a socket address
pub trait Resolve: Send + Sync + fmt::Debug {
    /// Resolves `host` and pairs the first address with `port`
    fn resolve<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<SocketAddr>>;
}

/// Resolver backed by the system DNS configuration.
///
/// The underlying resolver is created on first use, so a missing or broken
/// resolv.conf shows up as a retryable resolution failure instead of a
/// construction error.
#[derive(Default)]
pub struct DnsResolver {
    inner: OnceCell<TokioAsyncResolver>,
}

impl DnsResolver {
    /// Creates a new DNS resolver
    pub fn new() -> Self {
        DnsResolver {
            inner: OnceCell::new(),
        }
    }

    async fn resolver(&self) -> Result<&TokioAsyncResolver> {
        self.inner
            .get_or_try_init(|| async {
                TokioAsyncResolver::tokio_from_system_conf()
                    .map_err(|e| Error::resolution(format!("Failed to load resolver config: {}", e)))
            })
            .await
    }

    async fn lookup(&self, host: &str, port: u16) -> Result<SocketAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, port));
        }

        let lookup = self
            .resolver()
            .await?
            .lookup_ip(host)
            .await
            .map_err(|e| Error::resolution(format!("Failed to resolve {}: {}", host, e)))?;

        lookup
            .iter()
            .next()
            .map(|ip| SocketAddr::new(ip, port))
            .ok_or_else(|| Error::resolution(format!("No address found for {}", host)))
    }
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolver")
            .field("initialized", &self.inner.initialized())
            .finish()
    }
}

impl Resolve for DnsResolver {
    fn resolve<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<SocketAddr>> {
        self.lookup(host, port).boxed()
    }
}
