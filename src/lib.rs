//! # tinylink
//!
//! A URL shortener with deterministic keys and a layered reputation gate,
//! built with Axum and SQLite.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Key derivation, entities, and the store trait
//! - **Application Layer** ([`application`]) - Submission flow and business logic
//! - **Infrastructure Layer** ([`infrastructure`]) - SQLite persistence
//! - **Reputation Layer** ([`reputation`]) - Whitelist, blocklist, and
//!   reachability checks with a short-TTL verdict cache
//! - **API Layer** ([`api`]) - HTTP handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Content-derived short keys: the same URL always shortens to the same key
//! - Bounded collision resolution via salted re-derivation
//! - Layered submission checks: whitelist, SURBL-style DNS blocklist,
//!   reachability probe
//! - Token-guarded CSV export of every stored link
//!
//! ## Quick Start
//!
//! ```bash
//! # Everything has a default; a bare start uses ./data and port 3000
//! cargo run
//!
//! # Shorten a URL
//! curl -X POST http://localhost:3000/api/shorten \
//!   -H 'Content-Type: application/json' \
//!   -d '{"url": "https://example.com/some/long/path"}'
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod reputation;
pub mod state;

pub mod config;
pub mod server;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{LinkService, render_csv};
    pub use crate::domain::entities::{ShortKey, UrlRecord, derive_key};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
