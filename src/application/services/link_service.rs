//! Core application service: validation, key derivation, and the
//! submission flow through the reputation gate.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info};
use url::Url;

use crate::domain::entities::{ShortKey, UrlRecord, derive_key};
use crate::domain::store::LinkStore;
use crate::error::AppError;
use crate::reputation::ReputationGate;

/// Shortest URL accepted for shortening.
pub const MIN_URL_LENGTH: usize = 12;

/// How many alternative keys are derived after the initial one collides.
pub const MAX_KEY_ATTEMPTS: u32 = 5;

/// Service for shortening, resolving, and administering links.
///
/// Keys are derived from the URL itself, so submitting the same URL twice
/// yields the same key. Collisions between different URLs are resolved by
/// salting the derivation with an attempt counter.
pub struct LinkService<S: LinkStore> {
    store: Arc<S>,
    gate: ReputationGate,
}

impl<S: LinkStore> LinkService<S> {
    /// Creates a new link service.
    pub fn new(store: Arc<S>, gate: ReputationGate) -> Self {
        Self { store, gate }
    }

    /// Shortens `raw_url` and returns its key.
    ///
    /// Resubmitting an already-stored URL returns the existing key without
    /// another round of reputation checks or a write. New URLs pass the
    /// gate before being stored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - the URL is shorter than [`MIN_URL_LENGTH`] after trimming
    /// - the URL does not parse, has no host, or uses a non-HTTP scheme
    ///
    /// Returns [`AppError::Denied`] or [`AppError::Unreachable`] when the
    /// reputation gate rejects the submission, and [`AppError::Internal`]
    /// when every derived key is taken by another URL or storage fails.
    pub async fn submit(&self, raw_url: &str) -> Result<ShortKey, AppError> {
        let url = raw_url.trim();
        if url.len() < MIN_URL_LENGTH {
            return Err(AppError::bad_request(
                "URL is too short to shorten",
                json!({ "min_length": MIN_URL_LENGTH }),
            ));
        }

        let parsed = Url::parse(url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::bad_request(
                "Only http and https URLs are supported",
                json!({ "scheme": parsed.scheme() }),
            ));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| AppError::bad_request("URL has no host", json!({})))?
            .to_string();

        let mut attempt = 0;
        let key = loop {
            if attempt > MAX_KEY_ATTEMPTS {
                error!(
                    "No free key for {url} after {} derivations",
                    MAX_KEY_ATTEMPTS + 1
                );
                return Err(AppError::internal(
                    "Could not derive a free key",
                    json!({ "attempts": MAX_KEY_ATTEMPTS + 1 }),
                ));
            }
            let candidate = derive_key(url, attempt);
            match self.store.get(candidate.as_str()).await? {
                None => break candidate,
                Some(existing) if existing.url == url => {
                    debug!("Resubmission of known URL, returning {candidate}");
                    return Ok(candidate);
                }
                Some(_) => attempt += 1,
            }
        };

        self.gate.check(&host, url).await?;
        self.store.put(key.as_str(), url).await?;
        info!("Shortened {url} to {key}");
        Ok(key)
    }

    /// Looks up the record behind a key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    pub async fn resolve(&self, key: &ShortKey) -> Result<Option<UrlRecord>, AppError> {
        self.store.get(key.as_str()).await
    }

    /// Deletes a stored link. Removing an unknown key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.store.remove(key).await
    }

    /// Returns every stored record, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    pub async fn dump(&self) -> Result<Vec<UrlRecord>, AppError> {
        self.store.dump().await
    }

    /// Verifies the store answers queries. Used by the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the store does not respond.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.get("health").await.map(|_| ())
    }
}

/// Renders records in the dump format: a `token,url,created-unix-epoch-utc`
/// header followed by one CRLF-terminated row per link.
pub fn render_csv(records: &[UrlRecord]) -> String {
    let mut out = String::from("token,url,created-unix-epoch-utc\r\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{}\r\n",
            record.key,
            record.url,
            record.created_at.timestamp()
        ));
    }
    out
}
