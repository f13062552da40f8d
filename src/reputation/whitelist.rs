//! Host allow-list with wildcard suffixes and conditional reload.

use anyhow::Context;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{http_date, parse_http_date};

/// Interval between reload checks of the whitelist source.
pub const WHITELIST_RELOAD_INTERVAL: Duration = Duration::from_secs(10);

/// Where the whitelist is loaded from.
#[derive(Debug, Clone)]
pub enum WhitelistSource {
    File(PathBuf),
    Http(String),
}

impl WhitelistSource {
    /// Classifies a configured source string: URLs are fetched, everything
    /// else is treated as a local path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Http(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for WhitelistSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => f.write_str(url),
        }
    }
}

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// Matches one host exactly.
    Exact(String),
    /// Leading-dot entry, stored with the dot. Matches the bare suffix host
    /// and any subdomain of it.
    Suffix(String),
}

impl Pattern {
    fn parse(entry: &str) -> Self {
        if entry.starts_with('.') {
            Self::Suffix(entry.to_string())
        } else {
            Self::Exact(entry.to_string())
        }
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(name) => host == name,
            Self::Suffix(suffix) => host.ends_with(suffix.as_str()) || host == &suffix[1..],
        }
    }
}

/// Immutable parsed allow-list.
struct WhitelistSet {
    patterns: Vec<Pattern>,
}

impl WhitelistSet {
    fn parse(text: &str) -> Self {
        let patterns = text
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                // Skip comments and empty lines
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                Some(Pattern::parse(&line.to_lowercase()))
            })
            .collect();
        Self { patterns }
    }

    fn matches(&self, host: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(host))
    }

    fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Allow-list matcher with background reload.
///
/// The matcher distinguishes "never loaded" from "loaded empty": until a
/// snapshot has been installed every host passes, so a broken source degrades
/// to a disabled check instead of blocking all submissions. Once a snapshot
/// exists, only listed hosts pass; an empty file therefore rejects everything.
pub struct WhitelistMatcher {
    source: WhitelistSource,
    client: Client,
    snapshot: ArcSwapOption<WhitelistSet>,
    last_modified: Mutex<Option<DateTime<Utc>>>,
}

impl WhitelistMatcher {
    /// Creates a matcher for the given source. No snapshot is loaded yet.
    pub fn new(source: WhitelistSource, client: Client) -> Self {
        Self {
            source,
            client,
            snapshot: ArcSwapOption::empty(),
            last_modified: Mutex::new(None),
        }
    }

    /// Whether `host` passes the whitelist. Comparison is case-insensitive.
    pub fn matches(&self, host: &str) -> bool {
        match self.snapshot.load().as_ref() {
            None => true,
            Some(set) => set.matches(&host.to_lowercase()),
        }
    }

    /// Number of patterns in the current snapshot, or `None` before the first
    /// successful load.
    pub fn snapshot_len(&self) -> Option<usize> {
        self.snapshot.load().as_ref().map(|set| set.len())
    }

    /// Reloads the whitelist if the source changed since the last load.
    ///
    /// Files are compared by modification time; HTTP sources are fetched with
    /// `If-Modified-Since` and a `304 Not Modified` keeps the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be read. The current snapshot
    /// stays in place.
    pub async fn reload_if_modified(&self) -> anyhow::Result<bool> {
        match &self.source {
            WhitelistSource::File(path) => self.reload_from_file(path).await,
            WhitelistSource::Http(url) => self.reload_from_http(url).await,
        }
    }

    async fn reload_from_file(&self, path: &Path) -> anyhow::Result<bool> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("reading whitelist at {}", path.display()))?;
        let modified = DateTime::<Utc>::from(
            metadata
                .modified()
                .context("whitelist modification time unavailable")?,
        );

        {
            let last = self.last_modified.lock().unwrap();
            if let Some(last) = *last
                && modified <= last
            {
                return Ok(false);
            }
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading whitelist at {}", path.display()))?;
        self.install(WhitelistSet::parse(&text), modified);
        Ok(true)
    }

    async fn reload_from_http(&self, url: &str) -> anyhow::Result<bool> {
        let mut request = self.client.get(url);
        {
            let last = self.last_modified.lock().unwrap();
            if let Some(since) = *last {
                request = request.header(header::IF_MODIFIED_SINCE, http_date(since));
            }
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("fetching whitelist from {url}"))?;
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(false);
        }

        let response = response.error_for_status()?;
        let stamp = response
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
            .unwrap_or_else(Utc::now);
        let text = response.text().await?;
        self.install(WhitelistSet::parse(&text), stamp);
        Ok(true)
    }

    fn install(&self, set: WhitelistSet, stamp: DateTime<Utc>) {
        info!(
            "Whitelist loaded: {} patterns from {}",
            set.len(),
            self.source
        );
        self.snapshot.store(Some(Arc::new(set)));
        *self.last_modified.lock().unwrap() = Some(stamp);
    }
}

/// Periodically reloads the whitelist from its source.
///
/// Runs for the life of the process. Failures keep the previous snapshot (or
/// the fail-open default) and are logged at warn level.
pub async fn run_reload_loop(matcher: Arc<WhitelistMatcher>) {
    let mut interval = tokio::time::interval(WHITELIST_RELOAD_INTERVAL);
    // The first tick fires immediately and startup has already loaded.
    interval.tick().await;
    loop {
        interval.tick().await;
        match matcher.reload_if_modified().await {
            Ok(_) => debug!("Whitelist reload check complete"),
            Err(e) => warn!("Whitelist reload failed: {e}; keeping previous snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_matcher(dir: &tempfile::TempDir, contents: &str) -> WhitelistMatcher {
        let path = dir.path().join("whitelist");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        WhitelistMatcher::new(WhitelistSource::File(path), Client::new())
    }

    #[test]
    fn test_source_classification() {
        assert!(matches!(
            WhitelistSource::parse("https://example.com/whitelist"),
            WhitelistSource::Http(_)
        ));
        assert!(matches!(
            WhitelistSource::parse("./data/whitelist"),
            WhitelistSource::File(_)
        ));
    }

    #[test]
    fn test_never_loaded_accepts_everything() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = file_matcher(&dir, "example.com\n");

        assert!(matcher.snapshot_len().is_none());
        assert!(matcher.matches("anything.invalid"));
    }

    #[tokio::test]
    async fn test_loaded_empty_rejects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = file_matcher(&dir, "# comments only\n\n");

        assert!(matcher.reload_if_modified().await.unwrap());
        assert_eq!(matcher.snapshot_len(), Some(0));
        assert!(!matcher.matches("example.com"));
    }

    #[tokio::test]
    async fn test_exact_and_suffix_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = file_matcher(&dir, "example.com\n.trusted.org\n");
        matcher.reload_if_modified().await.unwrap();

        assert!(matcher.matches("example.com"));
        assert!(matcher.matches("EXAMPLE.com"));
        assert!(!matcher.matches("www.example.com"));

        assert!(matcher.matches("trusted.org"));
        assert!(matcher.matches("api.trusted.org"));
        assert!(!matcher.matches("nottrusted.org"));
    }

    #[tokio::test]
    async fn test_unchanged_file_is_not_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = file_matcher(&dir, "example.com\n");

        assert!(matcher.reload_if_modified().await.unwrap());
        assert!(!matcher.reload_if_modified().await.unwrap());
    }

    #[tokio::test]
    async fn test_modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whitelist");
        std::fs::write(&path, "old.example.com\n").unwrap();

        let matcher = WhitelistMatcher::new(WhitelistSource::File(path.clone()), Client::new());
        matcher.reload_if_modified().await.unwrap();
        assert!(matcher.matches("old.example.com"));

        // Give the filesystem clock a moment so the new mtime is strictly later.
        tokio::time::sleep(Duration::from_millis(20)).await;
        std::fs::write(&path, "new.example.com\n").unwrap();

        assert!(matcher.reload_if_modified().await.unwrap());
        assert!(matcher.matches("new.example.com"));
        assert!(!matcher.matches("old.example.com"));
    }

    #[tokio::test]
    async fn test_missing_file_keeps_snapshot_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = file_matcher(&dir, "example.com\n");
        matcher.reload_if_modified().await.unwrap();

        std::fs::remove_file(dir.path().join("whitelist")).unwrap();

        assert!(matcher.reload_if_modified().await.is_err());
        // Previous snapshot still answers.
        assert!(matcher.matches("example.com"));
    }
}
