//! DNS resolution seam for blocklist queries.

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Error returned by [`NameResolver::lookup_ipv4`].
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The name does not exist (NXDOMAIN or no records of the requested type).
    #[error("name not found")]
    NotFound,
    /// The query could not be completed (timeout, refused, network failure).
    #[error("lookup failed: {0}")]
    Failed(String),
}

/// Minimal resolver interface used by the SURBL check.
///
/// Only A-record resolution is needed: a blocklist zone answers listed names
/// with addresses in `127.0.0.0/8` and unlisted names with NXDOMAIN.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolves `name` to its IPv4 addresses.
    async fn lookup_ipv4(&self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError>;
}

/// UDP resolver backed by hickory, with caching disabled.
///
/// Blocklist answers must stay fresh and the decision cache above this layer
/// already bounds query volume, so the resolver keeps no cache of its own and
/// sends a single attempt per query.
pub struct HickoryResolver {
    inner: TokioResolver,
}

impl HickoryResolver {
    /// Builds a resolver against the given upstream servers.
    ///
    /// With no servers configured this falls back to Google public DNS. Most
    /// public resolvers are refused by SURBL, so production deployments should
    /// point `DNS_SERVERS` at a resolver of their own.
    pub fn new(servers: &[SocketAddr], timeout: Duration) -> Self {
        let config = if servers.is_empty() {
            ResolverConfig::google()
        } else {
            let mut config = ResolverConfig::new();
            for addr in servers {
                config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            }
            config
        };

        let mut opts = ResolverOpts::default();
        opts.cache_size = 0;
        opts.attempts = 1;
        opts.timeout = timeout;

        let inner = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Self { inner }
    }
}

#[async_trait]
impl NameResolver for HickoryResolver {
    async fn lookup_ipv4(&self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError> {
        match self.inner.lookup_ip(name).await {
            Ok(lookup) => Ok(lookup
                .into_iter()
                .filter_map(|addr| match addr {
                    IpAddr::V4(v4) => Some(v4),
                    IpAddr::V6(_) => None,
                })
                .collect()),
            Err(e) if e.is_no_records_found() => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Failed(e.to_string())),
        }
    }
}
