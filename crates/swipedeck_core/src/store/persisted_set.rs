//! Generic persisted boolean set.
//!
//! # Responsibility
//! - Expose `contains`/`add`/`remove`/`snapshot` over one storage key.
//! - Encode membership as a JSON array of strings in the backend.
//! - Publish writes on the storage bus and reload on external changes.
//!
//! # Invariants
//! - After `add(id)` returns, `contains(id)` is `true`.
//! - The durable write happens before the in-memory value is committed.
//! - Write failures are logged and swallowed; the in-memory value still
//!   commits, so the set degrades to memory-only for that operation.
//! - Malformed stored data reads as the empty set.
//! - Observers see every committed change exactly once, in commit order.
//! - Writes by other connections to the same backend are picked up by
//!   `sync` through the repository change stamp, with or without a bus.

use crate::repo::kv_repo::KeyValueRepository;
use crate::sync::storage_bus::{
    new_context_id, BusSubscription, ContextId, StorageBus, StorageEventKind,
};
use log::{debug, warn};
use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Membership snapshot. Ordered so encoded arrays are deterministic.
pub type IdSet = BTreeSet<String>;

/// Handle returned by `observe`, used to stop observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Origin of a committed membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Local,
    External,
}

type Observer = Box<dyn FnMut(&IdSet, ChangeSource) + Send>;

/// Durable string-set bound to one storage key.
pub struct PersistedSet<R: KeyValueRepository> {
    key: String,
    repo: R,
    context: ContextId,
    bus: Option<StorageBus>,
    subscription: Option<BusSubscription>,
    external_pending: bool,
    stamp: Option<u64>,
    members: OnceCell<Arc<IdSet>>,
    revision: u64,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl<R: KeyValueRepository> PersistedSet<R> {
    /// Creates a set that does not take part in cross-context propagation.
    pub fn new(key: impl Into<String>, repo: R) -> Self {
        let stamp = repo.change_stamp().ok().flatten();
        Self {
            key: key.into(),
            repo,
            context: new_context_id(),
            bus: None,
            subscription: None,
            external_pending: false,
            stamp,
            members: OnceCell::new(),
            revision: 0,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Creates a set attached to `bus` as execution context `context`.
    pub fn with_bus(
        key: impl Into<String>,
        repo: R,
        bus: &StorageBus,
        context: ContextId,
    ) -> Self {
        let mut set = Self::new(key, repo);
        set.context = context;
        set.subscription = Some(bus.subscribe(context));
        set.bus = Some(bus.clone());
        set
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Monotonic counter bumped on every committed change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, id: &str) -> bool {
        self.current().contains(id)
    }

    /// Current membership. Cheap to clone; never mutated in place.
    pub fn snapshot(&self) -> Arc<IdSet> {
        Arc::clone(self.current())
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    pub fn add(&mut self, id: &str) {
        if self.contains(id) {
            return;
        }
        let mut next = IdSet::clone(self.current());
        next.insert(id.to_string());
        self.commit(next);
    }

    pub fn remove(&mut self, id: &str) {
        if !self.contains(id) {
            return;
        }
        let mut next = IdSet::clone(self.current());
        next.remove(id);
        self.commit(next);
    }

    /// Inverts membership of `id` in one commit; returns the new membership.
    pub fn toggle(&mut self, id: &str) -> bool {
        let mut next = IdSet::clone(self.current());
        let now_member = if next.remove(id) {
            false
        } else {
            next.insert(id.to_string());
            true
        };
        self.commit(next);
        now_member
    }

    /// Replaces the whole set and persists it.
    pub fn replace(&mut self, next: IdSet) {
        self.commit(next);
    }

    /// Removes the stored key entirely and commits an empty set in memory.
    pub fn delete_stored(&mut self) {
        match self.repo.delete(&self.key) {
            Ok(()) => self.publish(),
            Err(err) => warn!(
                "event=set_delete module=store status=error key={} error={}",
                self.key, err
            ),
        }
        self.apply(IdSet::new(), ChangeSource::Local);
    }

    /// Drains the storage bus and checks the backend change stamp. When
    /// another context or connection wrote, the full set is re-read and
    /// republished. Returns whether membership changed.
    pub fn sync(&mut self) -> bool {
        self.drain_bus();
        let bus_external = std::mem::take(&mut self.external_pending);
        let stamp_moved = self.refresh_stamp();
        if !bus_external && !stamp_moved {
            return false;
        }

        let reloaded = read_set(&self.repo, &self.key);
        if self.members.get().is_some_and(|current| **current == reloaded) {
            debug!(
                "event=set_reload module=store status=unchanged key={}",
                self.key
            );
            return false;
        }
        debug!(
            "event=set_reload module=store status=ok key={} size={}",
            self.key,
            reloaded.len()
        );
        self.apply(reloaded, ChangeSource::External);
        true
    }

    /// Registers `observer`, invoked after every committed change.
    pub fn observe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&IdSet, ChangeSource) + Send + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn current(&self) -> &Arc<IdSet> {
        self.members
            .get_or_init(|| Arc::new(read_set(&self.repo, &self.key)))
    }

    fn commit(&mut self, next: IdSet) {
        match encode_set(&next) {
            Ok(encoded) => match self.repo.put(&self.key, &encoded) {
                Ok(()) => {
                    debug!(
                        "event=set_write module=store status=ok key={} size={}",
                        self.key,
                        next.len()
                    );
                    self.publish();
                }
                Err(err) => warn!(
                    "event=set_write module=store status=error key={} error_code=storage_write_failed error={}",
                    self.key, err
                ),
            },
            Err(err) => warn!(
                "event=set_write module=store status=error key={} error_code=serialize_failed error={}",
                self.key, err
            ),
        }
        self.apply(next, ChangeSource::Local);
    }

    fn apply(&mut self, next: IdSet, source: ChangeSource) {
        let next = Arc::new(next);
        match self.members.get_mut() {
            Some(current) => *current = Arc::clone(&next),
            None => {
                let _ = self.members.set(Arc::clone(&next));
            }
        }
        self.revision += 1;
        for (_, observer) in self.observers.iter_mut() {
            observer(&next, source);
        }
    }

    fn publish(&mut self) {
        if let Some(bus) = &self.bus {
            bus.publish(self.context, &self.key);
        }
        self.drain_bus();
    }

    /// Consumes queued bus records, remembering external writes to this key
    /// for the next `sync`.
    fn drain_bus(&mut self) {
        let Some(subscription) = self.subscription.as_mut() else {
            return;
        };
        let key = &self.key;
        let external = subscription
            .drain()
            .into_iter()
            .any(|event| event.key == *key && event.kind == StorageEventKind::ExternalChange);
        self.external_pending |= external;
    }

    /// Returns whether another connection committed since the last check.
    fn refresh_stamp(&mut self) -> bool {
        match self.repo.change_stamp() {
            Ok(Some(stamp)) => {
                let moved = self.stamp.is_some_and(|seen| seen != stamp);
                self.stamp = Some(stamp);
                moved
            }
            Ok(None) => false,
            Err(err) => {
                warn!(
                    "event=set_sync module=store status=error key={} error_code=change_stamp_failed error={}",
                    self.key, err
                );
                false
            }
        }
    }
}

/// Reads and decodes the set stored under `key`, degrading to empty.
fn read_set<R: KeyValueRepository>(repo: &R, key: &str) -> IdSet {
    match repo.get(key) {
        Ok(Some(raw)) => decode_set(&raw).unwrap_or_else(|| {
            warn!(
                "event=set_read module=store status=error key={} error_code=malformed_value",
                key
            );
            IdSet::new()
        }),
        Ok(None) => IdSet::new(),
        Err(err) => {
            warn!(
                "event=set_read module=store status=error key={} error_code=storage_read_failed error={}",
                key, err
            );
            IdSet::new()
        }
    }
}

/// Decodes a JSON array, keeping non-empty string members only.
/// Returns `None` when `raw` is not a JSON array.
pub(crate) fn decode_set(raw: &str) -> Option<IdSet> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(values) => Some(
            values
                .iter()
                .filter_map(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn encode_set(set: &IdSet) -> serde_json::Result<String> {
    serde_json::to_string(&set.iter().collect::<Vec<_>>())
}
