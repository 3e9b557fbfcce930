//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable key/value contract behind every preference set.
//! - Isolate SQLite query details from store logic.
//!
//! # Invariants
//! - Values are opaque strings at this layer; JSON encoding lives in stores.
//! - Repository APIs return errors; swallowing them is a store decision.

pub mod kv_repo;
