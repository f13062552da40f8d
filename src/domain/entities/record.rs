//! Stored link record mapping a short key to its destination.

use chrono::{DateTime, Utc};

/// A stored short link.
///
/// Represents one row of the link store: the derived key, the destination URL
/// exactly as it was submitted, and the moment the mapping was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub key: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl UrlRecord {
    /// Creates a new record.
    pub fn new(key: String, url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            url,
            created_at,
        }
    }
}
