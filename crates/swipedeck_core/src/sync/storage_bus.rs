//! Publish/subscribe channel over durable storage writes.
//!
//! # Responsibility
//! - Record every successful durable write as `{ key, origin }`.
//! - Let each execution context drain the records it has not seen yet.
//!
//! # Invariants
//! - Each subscription owns a read cursor kept in the shared state.
//! - A record is reported as `LocalWrite` to the context that produced it
//!   and as `ExternalChange` to every other context.
//! - Subscriptions only observe records published after they were created.
//! - Records every live subscription has drained are dropped; with no
//!   subscriptions nothing is retained.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Identity of one execution context (one tab, one window, one process).
pub type ContextId = Uuid;

/// Creates a fresh context identity.
pub fn new_context_id() -> ContextId {
    Uuid::new_v4()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEventKind {
    /// This context wrote the key itself.
    LocalWrite,
    /// Another context wrote the key; in-memory views may be stale.
    ExternalChange,
}

/// Change notification delivered to one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub kind: StorageEventKind,
}

#[derive(Debug, Clone)]
struct ChangeRecord {
    key: String,
    origin: ContextId,
}

/// Retained records plus every live cursor. Sequence numbers are absolute:
/// `records[0]` has sequence `first_seq`.
#[derive(Debug, Default)]
struct BusLog {
    records: VecDeque<ChangeRecord>,
    first_seq: u64,
    cursors: BTreeMap<u64, u64>,
    next_subscriber: u64,
}

impl BusLog {
    fn end_seq(&self) -> u64 {
        self.first_seq + self.records.len() as u64
    }

    /// Drops records below the slowest cursor.
    fn compact(&mut self) {
        let keep_from = self
            .cursors
            .values()
            .copied()
            .min()
            .unwrap_or_else(|| self.end_seq());
        while self.first_seq < keep_from && self.records.pop_front().is_some() {
            self.first_seq += 1;
        }
    }
}

/// Shared change log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct StorageBus {
    log: Arc<Mutex<BusLog>>,
}

fn lock(log: &Mutex<BusLog>) -> MutexGuard<'_, BusLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StorageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `origin` wrote `key`.
    pub fn publish(&self, origin: ContextId, key: &str) {
        let mut log = lock(&self.log);
        if log.cursors.is_empty() {
            log.first_seq += 1;
            return;
        }
        log.records.push_back(ChangeRecord {
            key: key.to_string(),
            origin,
        });
    }

    /// Opens a subscription for `context`, positioned at the end of the log.
    pub fn subscribe(&self, context: ContextId) -> BusSubscription {
        let mut log = lock(&self.log);
        let id = log.next_subscriber;
        log.next_subscriber += 1;
        let end = log.end_seq();
        log.cursors.insert(id, end);
        BusSubscription {
            id,
            context,
            log: Arc::clone(&self.log),
        }
    }

    /// Records still retained for subscriptions that have not drained them.
    pub fn len(&self) -> usize {
        lock(&self.log).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.log).cursors.len()
    }
}

/// One context's cursor into a `StorageBus`. Dropping it releases the
/// records it was holding back.
#[derive(Debug)]
pub struct BusSubscription {
    id: u64,
    context: ContextId,
    log: Arc<Mutex<BusLog>>,
}

impl BusSubscription {
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Number of records not drained yet.
    pub fn pending(&self) -> usize {
        let log = lock(&self.log);
        let cursor = log.cursors.get(&self.id).copied().unwrap_or(log.first_seq);
        (log.end_seq().saturating_sub(cursor.max(log.first_seq))) as usize
    }

    /// Returns every record published since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<StorageEvent> {
        let mut log = lock(&self.log);
        let cursor = log.cursors.get(&self.id).copied().unwrap_or(log.first_seq);
        let skip = cursor.saturating_sub(log.first_seq) as usize;
        let events = log
            .records
            .iter()
            .skip(skip)
            .map(|record| StorageEvent {
                key: record.key.clone(),
                kind: if record.origin == self.context {
                    StorageEventKind::LocalWrite
                } else {
                    StorageEventKind::ExternalChange
                },
            })
            .collect();
        let end = log.end_seq();
        log.cursors.insert(self.id, end);
        log.compact();
        events
    }
}

impl Drop for BusSubscription {
    fn drop(&mut self) {
        let mut log = lock(&self.log);
        log.cursors.remove(&self.id);
        log.compact();
    }
}
