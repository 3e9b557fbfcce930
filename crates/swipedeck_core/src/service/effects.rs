//! Deferred preference mutations produced by a swipe.
//!
//! The deck commits its pop first; the resulting store mutations are queued
//! here and applied only after deck observers have been notified.

use crate::model::card::CardId;
use crate::model::swipe::{SwipeAction, SwipeDirection};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Like(CardId),
    Unlike(CardId),
    MarkSeen(CardId),
}

impl SideEffect {
    /// Effects for a confirmed swipe of `id`, in application order.
    pub fn for_swipe(id: &str, direction: SwipeDirection) -> [SideEffect; 2] {
        let preference = match direction.action() {
            SwipeAction::Like => SideEffect::Like(id.to_string()),
            SwipeAction::Unlike => SideEffect::Unlike(id.to_string()),
        };
        [preference, SideEffect::MarkSeen(id.to_string())]
    }
}

#[derive(Debug, Default)]
pub struct EffectQueue {
    pending: VecDeque<SideEffect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, effect: SideEffect) {
        self.pending.push_back(effect);
    }

    pub fn extend(&mut self, effects: impl IntoIterator<Item = SideEffect>) {
        self.pending.extend(effects);
    }

    pub fn pop(&mut self) -> Option<SideEffect> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
