//! Core domain entities representing the business data model.
//!
//! This module contains the fundamental data structures of the shortening
//! service. Entities are plain data; the only logic here is key derivation,
//! which is pure and side-effect free.
//!
//! # Entity Types
//!
//! - [`ShortKey`] - A validated six-character link identifier
//! - [`UrlRecord`] - A stored key/URL mapping with its creation time
//!
//! All entities include unit tests demonstrating their construction and usage.

pub mod key;
pub mod record;

pub use key::{InvalidKey, KEY_LENGTH, ShortKey, derive_key};
pub use record::UrlRecord;
