//! Persisted preference sets.
//!
//! # Responsibility
//! - Keep process-wide id membership sets durable across sessions.
//! - Reconverge in-memory views when another context writes the same key.
//!
//! # Invariants
//! - Mutations are write-through and never fail from the caller's view.
//! - Cross-context propagation replaces the whole set (last writer wins).

pub mod likes;
pub mod persisted_set;
pub mod seen;
