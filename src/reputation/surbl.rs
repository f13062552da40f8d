//! SURBL blocklist check with TLD-aware domain rollup.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use super::resolver::{LookupError, NameResolver};
use super::tld::{TldCache, TldSets};

/// Result of checking one host against the blocklist zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurblVerdict {
    /// The zone has no entry for the host.
    Clean,
    /// The zone lists the host; `query` is the name that matched.
    Listed { query: String },
}

/// Error terminating a SURBL check before any verdict was reached.
#[derive(Debug, thiserror::Error)]
pub enum SurblError {
    /// The host form cannot be queried against the zone (IPv6 literal).
    #[error("unsupported address form: {0}")]
    Unsupported(String),
    /// The DNS query itself failed. Callers reject without caching.
    #[error("blocklist lookup failed: {0}")]
    Lookup(String),
}

/// Checks hosts against a SURBL-style DNS blocklist zone.
///
/// Hostname queries are reduced to the registered domain first: querying
/// `www.phish.example.com` asks the zone about `example.com`, with the TLD
/// tables widening the cut for suffixes like `co.uk`. IPv4 literals are
/// queried reversed-octet, the way DNSBLs expect. A listed name answers with
/// an address in `127.0.0.0/8`; an NXDOMAIN means clean.
pub struct SurblChecker {
    resolver: Arc<dyn NameResolver>,
    tlds: Arc<TldCache>,
    zone: String,
}

impl SurblChecker {
    /// Creates a checker querying the given zone, e.g. `multi.surbl.org`.
    pub fn new(resolver: Arc<dyn NameResolver>, tlds: Arc<TldCache>, zone: impl Into<String>) -> Self {
        Self {
            resolver,
            tlds,
            zone: zone.into(),
        }
    }

    /// Checks `host` against the blocklist zone.
    ///
    /// # Errors
    ///
    /// - [`SurblError::Unsupported`] for IPv6 literals
    /// - [`SurblError::Lookup`] when the DNS query fails
    pub async fn check(&self, host: &str) -> Result<SurblVerdict, SurblError> {
        let candidate = match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => {
                let [a, b, c, d] = v4.octets();
                format!("{d}.{c}.{b}.{a}")
            }
            Ok(IpAddr::V6(_)) => {
                return Err(SurblError::Unsupported(
                    "IPv6 literals cannot be queried against the blocklist".to_string(),
                ));
            }
            Err(_) => {
                let sets = self.tlds.sets();
                rollup(host, &sets)
            }
        };

        // Trailing dot: the query is a FQDN, never subject to search suffixes.
        let query = format!("{candidate}.{}.", self.zone);
        debug!("Blocklist query: {query}");

        match self.resolver.lookup_ipv4(&query).await {
            Ok(addresses) => {
                if addresses.iter().any(|ip| ip.octets()[0] == 127) {
                    info!("Blocklist hit for {host} via {query}");
                    Ok(SurblVerdict::Listed { query })
                } else {
                    Ok(SurblVerdict::Clean)
                }
            }
            Err(LookupError::NotFound) => Ok(SurblVerdict::Clean),
            Err(LookupError::Failed(reason)) => Err(SurblError::Lookup(reason)),
        }
    }
}

/// Reduces `host` to the labels identifying its registered domain.
///
/// Starts from the last two labels; a hit in the two-level table widens the
/// cut to three labels, and a hit in the three-level table widens it to four.
fn rollup(host: &str, sets: &TldSets) -> String {
    let mut candidate = last_labels(host, 2);
    if sets.two_level.contains(&candidate) {
        candidate = last_labels(host, 3);
    }
    if sets.three_level.contains(&candidate) {
        candidate = last_labels(host, 4);
    }
    candidate
}

fn last_labels(host: &str, count: usize) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(count);
    labels[start..].join(".")
}
