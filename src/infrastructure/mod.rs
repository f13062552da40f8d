//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! the concrete persistence backend.
//!
//! # Modules
//!
//! - [`persistence`] - SQLite store implementation

pub mod persistence;
