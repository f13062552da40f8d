//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating store calls,
//! validation, key derivation, and the reputation gate. Services consume the
//! store trait and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - URL submission, resolution, and
//!   administration

pub mod services;
