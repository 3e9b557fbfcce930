//! Fling timing contract.
//!
//! # Responsibility
//! - Own the one duration shared by the fling/snap-back transition and the
//!   delay before a swipe is applied to the deck.
//! - Track the single in-flight fling and report when it completes.
//!
//! # Invariants
//! - `FlingTiming` is created once per session from `EngineConfig::fling_ms`
//!   and handed to both the gesture recognizer and the coordinator.
//! - At most one fling is in flight (only the top card is interactive).
//! - A fling launched at `t` completes at exactly `t + duration_ms`.

use crate::config::EngineConfig;
use crate::model::card::CardId;
use crate::model::swipe::SwipeDirection;

/// Shared fling duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlingTiming {
    duration_ms: u64,
}

impl FlingTiming {
    pub fn new(duration_ms: u64) -> Self {
        Self { duration_ms }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.fling_ms)
    }

    /// Duration applied to the card transform transition.
    pub fn transition_ms(self) -> u64 {
        self.duration_ms
    }

    /// Instant at which the logical removal of a fling launched at `now_ms` fires.
    pub fn completes_at(self, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.duration_ms)
    }
}

/// Swipe decided by the recognizer but not yet applied to the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFling {
    pub direction: SwipeDirection,
    pub card_id: Option<CardId>,
    pub due_at_ms: u64,
}

#[derive(Debug)]
pub struct FlingCoordinator {
    timing: FlingTiming,
    pending: Option<PendingFling>,
}

impl FlingCoordinator {
    pub fn new(timing: FlingTiming) -> Self {
        Self {
            timing,
            pending: None,
        }
    }

    pub fn timing(&self) -> FlingTiming {
        self.timing
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingFling> {
        self.pending.as_ref()
    }

    /// Starts the logical countdown for a fling; returns its due instant.
    pub fn launch(
        &mut self,
        direction: SwipeDirection,
        card_id: Option<CardId>,
        now_ms: u64,
    ) -> u64 {
        let due_at_ms = self.timing.completes_at(now_ms);
        self.pending = Some(PendingFling {
            direction,
            card_id,
            due_at_ms,
        });
        due_at_ms
    }

    /// Takes the in-flight fling once `now_ms` has reached its due instant.
    pub fn poll_due(&mut self, now_ms: u64) -> Option<PendingFling> {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| now_ms >= pending.due_at_ms)
        {
            return self.pending.take();
        }
        None
    }

    /// Takes the in-flight fling regardless of time.
    pub fn take(&mut self) -> Option<PendingFling> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{FlingCoordinator, FlingTiming};
    use crate::config::EngineConfig;
    use crate::model::swipe::SwipeDirection;

    #[test]
    fn completes_exactly_after_duration() {
        let timing = FlingTiming::from_config(&EngineConfig::default());
        let mut coordinator = FlingCoordinator::new(timing);

        let due = coordinator.launch(SwipeDirection::Left, Some("a".to_string()), 1_000);
        assert_eq!(due, 1_320);
        assert!(coordinator.poll_due(1_319).is_none());
        assert!(coordinator.is_in_flight());

        let fired = coordinator.poll_due(1_320).unwrap();
        assert_eq!(fired.direction, SwipeDirection::Left);
        assert!(!coordinator.is_in_flight());
        assert!(coordinator.poll_due(5_000).is_none());
    }

    #[test]
    fn transition_and_delay_share_one_value() {
        let timing = FlingTiming::new(450);
        assert_eq!(timing.completes_at(0), timing.transition_ms());
    }
}
