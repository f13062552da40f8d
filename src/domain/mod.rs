//! Domain layer containing business entities and persistence contracts.
//!
//! This module implements the core domain model following Clean Architecture
//! principles. It defines entities and the store interface independent of
//! infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures and key derivation
//! - [`store`] - Persistence trait implemented by the infrastructure layer
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - The [`store::LinkStore`] trait defines the contract implemented by
//!   [`crate::infrastructure::persistence`]
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod store;

pub use store::LinkStore;

#[cfg(test)]
pub use store::MockLinkStore;
