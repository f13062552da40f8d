//! Bounded, time-limited cache of per-host reputation decisions.

use chrono::Utc;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Maximum number of hosts the cache remembers before evicting the
/// least-recently-used entry.
pub const DECISION_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// Outcome of the host reputation checks for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

/// A cached verdict together with the moment it was established.
#[derive(Debug, Clone, Copy)]
struct Decision {
    verdict: Verdict,
    established_at: i64,
}

/// LRU cache of host reputation verdicts with a fixed TTL.
///
/// Entries older than the TTL are ignored on lookup; the next fresh check for
/// that host overwrites them. The cache never stores more than
/// [`DECISION_CACHE_CAPACITY`] hosts. Lookups take the lock only for the map
/// operation, so it is safe to share across request handlers.
pub struct DecisionCache {
    ttl_seconds: i64,
    entries: Mutex<LruCache<String, Decision>>,
}

impl DecisionCache {
    /// Creates a cache whose entries expire `ttl_seconds` after being recorded.
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: ttl_seconds as i64,
            entries: Mutex::new(LruCache::new(DECISION_CACHE_CAPACITY)),
        }
    }

    /// Returns the unexpired verdict for `host`, if any.
    pub fn lookup(&self, host: &str) -> Option<Verdict> {
        self.lookup_at(host, Utc::now().timestamp())
    }

    /// Records a fresh verdict for `host`.
    pub fn record(&self, host: &str, verdict: Verdict) {
        self.record_at(host, verdict, Utc::now().timestamp());
    }

    pub(crate) fn lookup_at(&self, host: &str, now: i64) -> Option<Verdict> {
        let mut entries = self.entries.lock().unwrap();
        let decision = entries.get(host)?;
        if now - decision.established_at >= self.ttl_seconds {
            return None;
        }
        Some(decision.verdict)
    }

    pub(crate) fn record_at(&self, host: &str, verdict: Verdict, now: i64) {
        let mut entries = self.entries.lock().unwrap();
        entries.put(
            host.to_string(),
            Decision {
                verdict,
                established_at: now,
            },
        );
    }

    /// Number of hosts currently held, expired entries included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = DecisionCache::new(60);
        cache.record_at("example.com", Verdict::Deny, 1_000);

        assert_eq!(cache.lookup_at("example.com", 1_030), Some(Verdict::Deny));
        assert_eq!(cache.lookup_at("example.com", 1_059), Some(Verdict::Deny));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = DecisionCache::new(60);
        cache.record_at("example.com", Verdict::Allow, 1_000);

        assert_eq!(cache.lookup_at("example.com", 1_060), None);
        assert_eq!(cache.lookup_at("example.com", 1_061), None);
    }

    #[test]
    fn test_unknown_host_misses() {
        let cache = DecisionCache::new(60);
        assert_eq!(cache.lookup_at("example.com", 1_000), None);
    }

    #[test]
    fn test_rerecord_refreshes_verdict_and_clock() {
        let cache = DecisionCache::new(60);
        cache.record_at("example.com", Verdict::Deny, 1_000);
        cache.record_at("example.com", Verdict::Allow, 1_100);

        assert_eq!(cache.lookup_at("example.com", 1_150), Some(Verdict::Allow));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_host_evicted_at_capacity() {
        let cache = DecisionCache::new(3_600);
        let capacity = DECISION_CACHE_CAPACITY.get();

        for i in 0..=capacity {
            cache.record_at(&format!("host-{i}.example.com"), Verdict::Allow, 1_000);
        }

        assert_eq!(cache.len(), capacity);
        assert_eq!(cache.lookup_at("host-0.example.com", 1_001), None);
        assert_eq!(
            cache.lookup_at(&format!("host-{capacity}.example.com"), 1_001),
            Some(Verdict::Allow)
        );
    }
}
