//! Short key entity and deterministic key derivation.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use md5::{Digest, Md5};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Compiled regex for short key validation.
static KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{6}$").unwrap());

/// Length of every short key, in characters.
pub const KEY_LENGTH: usize = 6;

/// A six-character identifier addressing one stored link.
///
/// Keys use the URL-safe Base64 alphabet (`A-Z`, `a-z`, `0-9`, `-`, `_`) and
/// are always exactly [`KEY_LENGTH`] characters, so they fit in a path segment
/// without escaping. Keys are derived deterministically from the submitted URL
/// (see [`derive_key`]), never random.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortKey(String);

/// Error returned when a string does not have the shape of a short key.
#[derive(Debug, thiserror::Error)]
#[error("not a valid short key: expected {KEY_LENGTH} URL-safe Base64 characters")]
pub struct InvalidKey;

impl ShortKey {
    /// Parses a short key from client-supplied text.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKey`] if the input is not exactly [`KEY_LENGTH`]
    /// characters from the URL-safe Base64 alphabet. Callers serving lookups
    /// treat this the same as an unknown key.
    pub fn parse(input: &str) -> Result<Self, InvalidKey> {
        if KEY_REGEX.is_match(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(InvalidKey)
        }
    }

    /// Wraps a string already known to consist of URL-safe Base64 characters.
    ///
    /// Only the key derivation routine uses this, since a truncated Base64
    /// digest cannot contain characters outside the key alphabet.
    pub(crate) fn from_derived(key: String) -> Self {
        debug_assert!(KEY_REGEX.is_match(&key));
        Self(key)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the candidate key for `url` at the given collision attempt.
///
/// Attempt 0 hashes the URL text as submitted; attempt `n` (n ≥ 1) hashes
/// `"{n}:{url}"`, so each retry lands on an unrelated digest. The key is the
/// first [`KEY_LENGTH`] characters of the URL-safe Base64 encoding of the MD5
/// digest. The same URL and attempt always produce the same key, which is what
/// makes resubmission idempotent.
pub fn derive_key(url: &str, attempt: u32) -> ShortKey {
    let digest = if attempt == 0 {
        Md5::digest(url.as_bytes())
    } else {
        Md5::digest(format!("{attempt}:{url}").as_bytes())
    };
    let encoded = URL_SAFE_NO_PAD.encode(digest);
    // 16 digest bytes encode to 22 ASCII characters, so the slice is in range.
    ShortKey::from_derived(encoded[..KEY_LENGTH].to_string())
}
