//! SQLite store implementation.
//!
//! Concrete implementation of the domain store trait using SQLx with runtime
//! query binding.
//!
//! # Stores
//!
//! - [`SqliteLinkStore`] - Link storage, retrieval and dump export

pub mod sqlite_store;

pub use sqlite_store::SqliteLinkStore;
