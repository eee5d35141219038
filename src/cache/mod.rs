//! # Secret Caches
//!
//! The proxy keeps two independent [`TtlStore`] instances: one mapping secret
//! keys to upstream identifiers and one mapping identifiers to serialized
//! secrets. Both are created with the same TTL at startup.

pub mod ttl;

pub use ttl::{TouchPolicy, TtlStore};
