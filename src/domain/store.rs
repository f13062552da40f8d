//! Store trait for short link persistence.

use crate::domain::entities::UrlRecord;
use crate::error::AppError;
use async_trait::async_trait;

/// Persistence interface for short link mappings.
///
/// The store is a flat key/URL table: writes overwrite, reads return the full
/// record, and [`dump`](LinkStore::dump) exists for the operator export
/// endpoint. Key derivation and reputation checks happen above this layer, so
/// implementations never inspect URLs.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::SqliteLinkStore`] - SQLite implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Stores a key to URL mapping, overwriting any previous entry for `key`.
    ///
    /// Overwriting also refreshes the record's creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn put(&self, key: &str, url: &str) -> Result<(), AppError>;

    /// Looks up the record stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn get(&self, key: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Deletes the record stored under `key`.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn remove(&self, key: &str) -> Result<(), AppError>;

    /// Returns every stored record, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn dump(&self) -> Result<Vec<UrlRecord>, AppError>;

    /// Releases the underlying connections.
    ///
    /// Further calls after `close` fail; the store is meant to live for the
    /// whole process and be closed once on shutdown.
    async fn close(&self);
}
