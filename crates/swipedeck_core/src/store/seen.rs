//! Seen tracker.
//!
//! An id enters the seen set only after a confirmed swipe-away, never by
//! being displayed. The deck reads it only when (re)building its stack.

use super::persisted_set::{ChangeSource, IdSet, ObserverId, PersistedSet};
use crate::repo::kv_repo::KeyValueRepository;
use crate::sync::storage_bus::{ContextId, StorageBus};
use log::info;
use std::sync::Arc;

pub struct SeenTracker<R: KeyValueRepository> {
    set: PersistedSet<R>,
}

impl<R: KeyValueRepository> SeenTracker<R> {
    pub fn new(key: impl Into<String>, repo: R) -> Self {
        Self {
            set: PersistedSet::new(key, repo),
        }
    }

    pub fn with_bus(key: impl Into<String>, repo: R, bus: &StorageBus, context: ContextId) -> Self {
        Self {
            set: PersistedSet::with_bus(key, repo, bus, context),
        }
    }

    pub fn mark_seen(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.set.add(id);
    }

    pub fn is_seen(&self, id: &str) -> bool {
        !id.is_empty() && self.set.contains(id)
    }

    pub fn snapshot(&self) -> Arc<IdSet> {
        self.set.snapshot()
    }

    /// Forgets every dismissal so the next rebuild offers all cards again.
    ///
    /// Deletes the stored key, then stores an explicit empty array.
    pub fn reset(&mut self) {
        self.set.delete_stored();
        self.set.replace(IdSet::new());
        info!("event=seen_reset module=seen status=ok");
    }

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
}
