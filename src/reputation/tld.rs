//! Cached SURBL TLD tables driving domain rollup depth.

use arc_swap::ArcSwap;
use reqwest::{Client, StatusCode, header};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{cache_mtime, http_date};

/// How long an on-disk table copy stays fresh before it is refetched.
pub const TLD_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Immutable snapshot of both TLD tables.
///
/// The two-level table lists registrar suffixes like `co.uk`; the three-level
/// table lists suffixes like `act.edu.au`. The SURBL check uses them to decide
/// how many labels of a host form the registered domain.
#[derive(Debug, Default)]
pub struct TldSets {
    pub two_level: HashSet<String>,
    pub three_level: HashSet<String>,
}

struct TldList {
    url: String,
    cache_path: PathBuf,
}

/// Published TLD tables with a disk-backed daily refresh.
///
/// Startup prefers the on-disk copy when it is younger than
/// [`TLD_REFRESH_INTERVAL`]; otherwise the tables are fetched with a
/// conditional GET against the disk copy's modification time. Fetch failures
/// fall back to whatever disk copy exists, stale or not. Snapshots are
/// published through an [`ArcSwap`], so readers never block a refresh.
pub struct TldCache {
    two: TldList,
    three: TldList,
    client: Client,
    sets: ArcSwap<TldSets>,
}

impl TldCache {
    /// Creates the cache; tables are empty until the first load.
    ///
    /// Disk copies live under `data_dir`, named after the conventional SURBL
    /// file names (`two-level-tlds`, `three-level-tlds`).
    pub fn new(
        data_dir: &Path,
        two_level_url: &str,
        three_level_url: &str,
        client: Client,
    ) -> Self {
        Self {
            two: TldList {
                url: two_level_url.to_string(),
                cache_path: data_dir.join("two-level-tlds"),
            },
            three: TldList {
                url: three_level_url.to_string(),
                cache_path: data_dir.join("three-level-tlds"),
            },
            client,
            sets: ArcSwap::from_pointee(TldSets::default()),
        }
    }

    /// Returns the current table snapshot.
    pub fn sets(&self) -> Arc<TldSets> {
        self.sets.load_full()
    }

    /// Loads both tables at startup, preferring fresh disk copies.
    pub async fn load_or_refresh(&self) {
        self.rebuild(true).await;
    }

    /// Refetches both tables, bypassing the disk freshness check.
    pub async fn refresh(&self) {
        self.rebuild(false).await;
    }

    async fn rebuild(&self, prefer_fresh_disk: bool) {
        let two_level = load_list(&self.client, &self.two, prefer_fresh_disk).await;
        let three_level = load_list(&self.client, &self.three, prefer_fresh_disk).await;
        info!(
            "TLD tables loaded: {} two-level, {} three-level entries",
            two_level.len(),
            three_level.len()
        );
        self.sets.store(Arc::new(TldSets {
            two_level,
            three_level,
        }));
    }

    #[cfg(test)]
    pub(crate) fn install(&self, sets: TldSets) {
        self.sets.store(Arc::new(sets));
    }
}

/// Periodically refetches the TLD tables.
///
/// Runs for the life of the process. A failed refresh keeps the previous
/// snapshot in place.
pub async fn run_refresh_loop(cache: Arc<TldCache>) {
    let mut interval = tokio::time::interval(TLD_REFRESH_INTERVAL);
    // The first tick fires immediately and startup has already loaded.
    interval.tick().await;
    loop {
        interval.tick().await;
        cache.refresh().await;
    }
}

async fn load_list(client: &Client, list: &TldList, prefer_fresh_disk: bool) -> HashSet<String> {
    if prefer_fresh_disk {
        if let Some(text) = read_fresh_cache(&list.cache_path).await {
            return parse_domains(&text);
        }
    }

    match fetch_list(client, list).await {
        Ok(text) => parse_domains(&text),
        Err(e) => {
            warn!("Failed to fetch TLD table from {}: {e}", list.url);
            // Fall back to the disk copy, stale or not.
            match tokio::fs::read_to_string(&list.cache_path).await {
                Ok(text) => parse_domains(&text),
                Err(_) => HashSet::new(),
            }
        }
    }
}

async fn read_fresh_cache(path: &Path) -> Option<String> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let age = metadata.modified().ok()?.elapsed().ok()?;
    if age < TLD_REFRESH_INTERVAL {
        tokio::fs::read_to_string(path).await.ok()
    } else {
        None
    }
}

async fn fetch_list(client: &Client, list: &TldList) -> anyhow::Result<String> {
    let mut request = client.get(&list.url);
    if let Some(since) = cache_mtime(&list.cache_path).await {
        request = request.header(header::IF_MODIFIED_SINCE, http_date(since));
    }

    let response = request.send().await?;
    if response.status() == StatusCode::NOT_MODIFIED {
        return Ok(tokio::fs::read_to_string(&list.cache_path).await?);
    }

    let text = response.error_for_status()?.text().await?;
    if let Err(e) = tokio::fs::write(&list.cache_path, &text).await {
        warn!(
            "Failed to cache TLD table at {}: {e}",
            list.cache_path.display()
        );
    }
    Ok(text)
}

fn parse_domains(text: &str) -> HashSet<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(line.to_lowercase())
        })
        .collect()
}
