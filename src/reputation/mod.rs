//! Reputation pipeline guarding URL submissions.
//!
//! Components:
//! - [`whitelist`]: host allowlist with periodic reload
//! - [`surbl`]: DNS blocklist check with TLD-aware rollup
//! - [`tld`]: two- and three-level TLD tables backing the rollup
//! - [`probe`]: reachability probe against the submitted URL
//! - [`cache`]: short-TTL cache of per-host verdicts
//! - [`gate`]: orchestrates the enabled layers in order
//!
//! The whitelist and TLD tables are fetched over HTTP (or read from disk)
//! and refreshed by background loops; both loaders use `If-Modified-Since`
//! to skip unchanged downloads.

use std::path::Path;

use chrono::{DateTime, Utc};

pub mod cache;
pub mod gate;
pub mod probe;
pub mod resolver;
pub mod surbl;
pub mod tld;
pub mod whitelist;

pub use cache::{DecisionCache, Verdict};
pub use gate::ReputationGate;
pub use probe::ReachabilityProbe;
pub use resolver::{HickoryResolver, LookupError, NameResolver};
pub use surbl::{SurblChecker, SurblError, SurblVerdict};
pub use tld::{TldCache, TldSets};
pub use whitelist::{WhitelistMatcher, WhitelistSource};

/// Formats a timestamp for an `If-Modified-Since` header.
pub(crate) fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parses a `Last-Modified` header value.
pub(crate) fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Modification time of an on-disk cache file, if it exists.
pub(crate) async fn cache_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_round_trip() {
        let t = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let formatted = http_date(t);
        assert_eq!(formatted, "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_http_date(&formatted), Some(t));
    }

    #[test]
    fn test_parse_http_date_rejects_garbage() {
        assert_eq!(parse_http_date("not a date"), None);
        assert_eq!(parse_http_date(""), None);
    }
}
