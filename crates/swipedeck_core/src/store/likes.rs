//! Likes store.
//!
//! # Responsibility
//! - Provide like/unlike/toggle/clear over the liked-ids set.
//! - Derive liked views of a catalog that refresh on membership changes.
//!
//! # Invariants
//! - Every operation is a no-op for an empty id.
//! - `toggle` reads and inverts membership in a single commit.

use super::persisted_set::{ChangeSource, IdSet, ObserverId, PersistedSet};
use crate::catalog::Catalog;
use crate::model::card::{CardId, CardItem};
use crate::repo::kv_repo::KeyValueRepository;
use crate::sync::storage_bus::{ContextId, StorageBus};
use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

struct LikedItemsMemo {
    catalog: Catalog,
    revision: u64,
    items: Arc<[CardItem]>,
}

/// Liked-ids set with preference semantics.
pub struct LikesStore<R: KeyValueRepository> {
    set: PersistedSet<R>,
    memo: Option<LikedItemsMemo>,
}

impl<R: KeyValueRepository> LikesStore<R> {
    pub fn new(key: impl Into<String>, repo: R) -> Self {
        Self::from_set(PersistedSet::new(key, repo))
    }

    pub fn with_bus(key: impl Into<String>, repo: R, bus: &StorageBus, context: ContextId) -> Self {
        Self::from_set(PersistedSet::with_bus(key, repo, bus, context))
    }

    pub fn from_set(set: PersistedSet<R>) -> Self {
        Self { set, memo: None }
    }

    pub fn like(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.set.add(id);
        info!(
            "event=like module=likes status=ok liked_count={}",
            self.set.len()
        );
    }

    pub fn unlike(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.set.remove(id);
    }

    /// Inverts membership; returns whether `id` is liked afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        self.set.toggle(id)
    }

    pub fn is_liked(&self, id: &str) -> bool {
        !id.is_empty() && self.set.contains(id)
    }

    /// Empties the liked set.
    pub fn clear(&mut self) {
        self.set.replace(IdSet::new());
    }

    pub fn liked_ids(&self) -> Arc<IdSet> {
        self.set.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.set.revision()
    }

    /// Applies pending cross-context changes; see `PersistedSet::sync`.
    pub fn sync(&mut self) -> bool {
        self.set.sync()
    }

    pub fn observe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&IdSet, ChangeSource) + Send + 'static,
    {
        self.set.observe(observer)
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.set.unobserve(id)
    }

    /// Catalog items whose id is liked, in catalog order.
    ///
    /// Recomputed only when the catalog identity or membership changes.
    pub fn liked_items(&mut self, catalog: &Catalog) -> Arc<[CardItem]> {
        let revision = self.set.revision();
        if let Some(memo) = &self.memo {
            if memo.revision == revision && memo.catalog.same_as(catalog) {
                return Arc::clone(&memo.items);
            }
        }

        let liked = self.set.snapshot();
        let items: Arc<[CardItem]> = catalog
            .items()
            .iter()
            .filter(|item| item.tracked_id().is_some_and(|id| liked.contains(id)))
            .cloned()
            .collect();
        self.memo = Some(LikedItemsMemo {
            catalog: catalog.clone(),
            revision,
            items: Arc::clone(&items),
        });
        items
    }

    /// `id -> liked` for every tracked catalog item.
    pub fn like_map(&self, catalog: &Catalog) -> BTreeMap<CardId, bool> {
        let liked = self.set.snapshot();
        catalog
            .items()
            .iter()
            .filter_map(CardItem::tracked_id)
            .map(|id| (id.to_string(), liked.contains(id)))
            .collect()
    }
}
