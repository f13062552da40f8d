//! HTTP middleware for request processing.
//!
//! Provides observability middleware; the dump endpoint carries its token
//! in the path, so there is no auth layer.

pub mod tracing;
