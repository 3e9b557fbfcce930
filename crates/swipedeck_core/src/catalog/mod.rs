//! Catalog snapshots and the injected catalog cache.
//!
//! # Responsibility
//! - Represent one immutable catalog fetch with a comparable identity.
//! - Hold the per-session cached catalog with an explicit lifecycle.
//!
//! # Invariants
//! - Two `Catalog` values are "the same catalog" only when they share the
//!   same allocation; equal contents from a new fetch are a new catalog.

mod cache;

pub use cache::CatalogCache;

use crate::model::card::CardItem;
use std::sync::Arc;

/// Immutable, cheaply clonable catalog snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Arc<[CardItem]>,
}

impl Catalog {
    pub fn new(items: Vec<CardItem>) -> Self {
        Self {
            items: Arc::from(items),
        }
    }

    pub fn items(&self) -> &[CardItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identity comparison: `true` only for clones of the same fetch.
    pub fn same_as(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<CardItem>> for Catalog {
    fn from(value: Vec<CardItem>) -> Self {
        Self::new(value)
    }
}
