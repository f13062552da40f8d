//! Layered reputation gate run before a URL is accepted for shortening.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::cache::{DecisionCache, Verdict};
use super::probe::ReachabilityProbe;
use super::surbl::{SurblChecker, SurblError, SurblVerdict};
use super::whitelist::WhitelistMatcher;
use crate::error::AppError;

/// Runs the enabled reputation checks in order: whitelist, blocklist,
/// reachability probe.
///
/// Host-level verdicts are cached for a short TTL so repeated submissions of
/// the same host skip the whitelist and blocklist layers. The probe targets
/// the full URL and runs on every submission, cached verdict or not. Every
/// layer is optional; with none enabled the gate accepts everything.
pub struct ReputationGate {
    whitelist: Option<Arc<WhitelistMatcher>>,
    surbl: Option<SurblChecker>,
    probe: Option<ReachabilityProbe>,
    cache: Option<DecisionCache>,
}

impl ReputationGate {
    /// Assembles the gate from whichever layers are enabled.
    ///
    /// The decision cache only exists when at least one host-level check
    /// does; a probe-only gate has nothing cacheable.
    pub fn new(
        whitelist: Option<Arc<WhitelistMatcher>>,
        surbl: Option<SurblChecker>,
        probe: Option<ReachabilityProbe>,
        cache_ttl_seconds: u64,
    ) -> Self {
        let cache = (whitelist.is_some() || surbl.is_some())
            .then(|| DecisionCache::new(cache_ttl_seconds));
        Self {
            whitelist,
            surbl,
            probe,
            cache,
        }
    }

    /// Checks a submission, where `host` is the host component of `url`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Denied`] when the whitelist, blocklist, or a cached
    ///   verdict rejects the host
    /// - [`AppError::Validation`] when the host form cannot be checked
    /// - [`AppError::Unreachable`] when the probe gets no usable response
    /// - [`AppError::Internal`] when a blocklist lookup fails; this verdict
    ///   is never cached
    pub async fn check(&self, host: &str, url: &str) -> Result<(), AppError> {
        let host = host.trim_end_matches('.').to_lowercase();

        match self.cache.as_ref().and_then(|cache| cache.lookup(&host)) {
            Some(Verdict::Deny) => {
                debug!("Cached deny for {host}");
                return Err(AppError::denied(
                    "URL rejected by reputation checks",
                    json!({"host": host, "source": "cache"}),
                ));
            }
            Some(Verdict::Allow) => {
                debug!("Cached allow for {host}");
            }
            None => self.check_host(&host).await?,
        }

        if let Some(probe) = &self.probe
            && let Err(e) = probe.check(url).await
        {
            info!("Reachability probe failed for {url}: {e}");
            return Err(AppError::unreachable(
                "URL did not answer a test request",
                json!({"url": url, "reason": e.to_string()}),
            ));
        }

        Ok(())
    }

    /// Runs the host-level layers and caches the combined verdict.
    async fn check_host(&self, host: &str) -> Result<(), AppError> {
        let mut evaluated = false;

        if let Some(whitelist) = &self.whitelist {
            if !whitelist.matches(host) {
                self.record(host, Verdict::Deny);
                info!("Whitelist rejected {host}");
                return Err(AppError::denied(
                    "URL host is not whitelisted",
                    json!({"host": host, "source": "whitelist"}),
                ));
            }
            evaluated = true;
        }

        if let Some(surbl) = &self.surbl {
            match surbl.check(host).await {
                Ok(SurblVerdict::Clean) => evaluated = true,
                Ok(SurblVerdict::Listed { query }) => {
                    self.record(host, Verdict::Deny);
                    info!("Blocklist rejected {host} via {query}");
                    return Err(AppError::denied(
                        "URL host is listed on the blocklist",
                        json!({"host": host, "source": "surbl"}),
                    ));
                }
                Err(SurblError::Unsupported(reason)) => {
                    return Err(AppError::bad_request(
                        "URL host cannot be checked",
                        json!({"host": host, "reason": reason}),
                    ));
                }
                Err(SurblError::Lookup(reason)) => {
                    return Err(AppError::internal(
                        "Blocklist lookup failed",
                        json!({"host": host, "reason": reason}),
                    ));
                }
            }
        }

        if evaluated {
            self.record(host, Verdict::Allow);
        }
        Ok(())
    }

    fn record(&self, host: &str, verdict: Verdict) {
        if let Some(cache) = &self.cache {
            cache.record(host, verdict);
        }
    }
}
