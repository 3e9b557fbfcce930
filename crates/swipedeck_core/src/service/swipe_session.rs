//! Swipe session use-case service.
//!
//! # Responsibility
//! - Own the deck stack, gesture recognizer, fling coordinator and both
//!   preference stores for one execution context.
//! - Sequence a confirmed swipe: pop, notify deck observers, then apply
//!   like/unlike and mark-seen.
//!
//! # Invariants
//! - A pointer swipe reaches the deck exactly `fling_ms` after release.
//! - Keyboard swipes bypass the recognizer and the fling delay.
//! - Deck observers see the popped stack before any store mutation runs;
//!   every queued mutation completes before the call that popped returns.
//! - Seen-set changes never alter the current stack; only a new catalog
//!   identity rebuilds it.
//! - A catalog offered mid-drag is held until the drag resolves, so the
//!   captured pointer is always released through the recognizer.
//!
//! Time is injected as monotonic milliseconds on every input.

use super::effects::{EffectQueue, SideEffect};
use crate::catalog::Catalog;
use crate::config::{ConfigError, EngineConfig};
use crate::deck::{CardRole, DeckStack, GlyphFeedback, RenderFrame, VisibleCard};
use crate::fling::{FlingCoordinator, FlingTiming, PendingFling};
use crate::gesture::{
    CardVisual, GestureOutcome, GestureParams, GesturePhase, GestureRecognizer, InputSurface,
    PointerId, ReleaseKind, Viewport,
};
use crate::model::card::CardItem;
use crate::model::swipe::SwipeDirection;
use crate::repo::kv_repo::KeyValueRepository;
use crate::store::likes::LikesStore;
use crate::store::seen::SeenTracker;
use crate::sync::storage_bus::{ContextId, StorageBus};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Keyboard input relevant to the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl KeyInput {
    /// Maps a DOM-style key name.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            _ => Self::Other,
        }
    }

    fn direction(self) -> Option<SwipeDirection> {
        match self {
            Self::ArrowLeft => Some(SwipeDirection::Left),
            Self::ArrowRight => Some(SwipeDirection::Right),
            Self::Other => None,
        }
    }
}

/// Stack change published to deck observers.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckChange {
    Rebuilt {
        size: usize,
    },
    Popped {
        card: CardItem,
        direction: SwipeDirection,
        remaining: usize,
    },
}

/// Result of applying one swipe to the deck.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeResolution {
    pub card: CardItem,
    pub direction: SwipeDirection,
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub likes_changed: bool,
    pub seen_changed: bool,
}

type DeckObserver = Box<dyn FnMut(&DeckChange) + Send>;

/// One execution context's swipe engine.
pub struct SwipeSession<R: KeyValueRepository> {
    config: EngineConfig,
    likes: LikesStore<R>,
    seen: SeenTracker<R>,
    deck: DeckStack,
    recognizer: GestureRecognizer,
    fling: FlingCoordinator,
    feedback: GlyphFeedback,
    effects: EffectQueue,
    viewport: Viewport,
    rng: StdRng,
    deck_observers: Vec<DeckObserver>,
    deferred_catalog: Option<Catalog>,
}

impl<R: KeyValueRepository> SwipeSession<R> {
    /// Creates a session over prepared stores.
    pub fn new(
        config: EngineConfig,
        likes: LikesStore<R>,
        seen: SeenTracker<R>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let timing = FlingTiming::from_config(&config);
        Ok(Self {
            recognizer: GestureRecognizer::new(GestureParams::from_config(&config), timing),
            fling: FlingCoordinator::new(timing),
            feedback: GlyphFeedback::from_config(&config),
            config,
            likes,
            seen,
            deck: DeckStack::new(),
            effects: EffectQueue::new(),
            viewport: Viewport::default(),
            rng: StdRng::from_entropy(),
            deck_observers: Vec::new(),
            deferred_catalog: None,
        })
    }

    /// Creates both stores over one shared backend, attached to `bus` as
    /// execution context `context`.
    pub fn open(
        config: EngineConfig,
        repo: R,
        bus: &StorageBus,
        context: ContextId,
    ) -> Result<Self, ConfigError>
    where
        R: Clone,
    {
        config.validate()?;
        let likes = LikesStore::with_bus(config.likes_key.clone(), repo.clone(), bus, context);
        let seen = SeenTracker::with_bus(config.seen_key.clone(), repo, bus, context);
        Self::new(config, likes, seen)
    }

    /// Replaces the shuffle source with a deterministic one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn likes(&self) -> &LikesStore<R> {
        &self.likes
    }

    pub fn likes_mut(&mut self) -> &mut LikesStore<R> {
        &mut self.likes
    }

    pub fn seen(&self) -> &SeenTracker<R> {
        &self.seen
    }

    pub fn seen_mut(&mut self) -> &mut SeenTracker<R> {
        &mut self.seen
    }

    pub fn deck(&self) -> &DeckStack {
        &self.deck
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.recognizer.phase()
    }

    pub fn pending_fling(&self) -> Option<&PendingFling> {
        self.fling.pending()
    }

    /// Whether a catalog offered mid-drag is waiting to be applied.
    pub fn has_deferred_catalog(&self) -> bool {
        self.deferred_catalog.is_some()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current swipe threshold `T`.
    pub fn threshold(&self) -> f64 {
        self.recognizer.params().threshold(self.viewport)
    }

    /// Registers a stack observer, invoked before the swipe's store
    /// mutations run.
    pub fn observe_deck<F>(&mut self, observer: F)
    where
        F: FnMut(&DeckChange) + Send + 'static,
    {
        self.deck_observers.push(Box::new(observer));
    }

    /// Offers a catalog. Rebuilds the stack only when its identity differs
    /// from the one the stack was built from; returns whether it rebuilt.
    ///
    /// A fling still in flight is applied to the old stack first, so its
    /// card is marked seen and filtered out of the new one. During a drag
    /// the newest offer is held and applied once the drag resolves: right
    /// away on snap-back, or after the fling lands on a swipe.
    pub fn set_catalog(&mut self, catalog: &Catalog) -> bool {
        self.deferred_catalog = None;
        if self.deck.is_built_from(catalog) {
            return false;
        }
        if self.recognizer.is_dragging() {
            debug!("event=catalog_deferred module=session reason=drag_in_progress");
            self.deferred_catalog = Some(catalog.clone());
            return false;
        }
        if let Some(pending) = self.fling.take() {
            debug!(
                "event=fling_flush module=session reason=catalog_change direction={}",
                pending.direction.label()
            );
            self.apply_swipe(pending.direction);
        }
        self.recognizer.reset();

        let seen = self.seen.snapshot();
        self.deck.rebuild_if_changed(catalog, &seen, &mut self.rng);
        let change = DeckChange::Rebuilt {
            size: self.deck.len(),
        };
        self.notify_deck(&change);
        true
    }

    /// Pointer-down on the front card.
    pub fn pointer_down(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        x: f64,
        y: f64,
    ) -> bool {
        if self.deck.is_empty() {
            return false;
        }
        self.recognizer.pointer_down(surface, pointer, x, y)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64) -> Option<CardVisual> {
        self.recognizer.pointer_move(pointer, x, y)
    }

    pub fn pointer_up(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        now_ms: u64,
    ) -> Option<GestureOutcome> {
        self.release(surface, pointer, ReleaseKind::Up, now_ms)
    }

    pub fn pointer_cancel(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        now_ms: u64,
    ) -> Option<GestureOutcome> {
        self.release(surface, pointer, ReleaseKind::Cancel, now_ms)
    }

    pub fn pointer_leave(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        now_ms: u64,
    ) -> Option<GestureOutcome> {
        self.release(surface, pointer, ReleaseKind::Leave, now_ms)
    }

    /// Resolves a drag. A swipe starts the fling countdown; the deck is
    /// told at `now_ms + fling_ms` via `tick`.
    pub fn release(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        kind: ReleaseKind,
        now_ms: u64,
    ) -> Option<GestureOutcome> {
        let outcome = self
            .recognizer
            .release(surface, pointer, kind, self.viewport)?;
        self.feedback.on_drag_end(outcome.dx(), now_ms);

        if let Some(direction) = outcome.direction() {
            let card_id = self
                .deck
                .top()
                .and_then(CardItem::tracked_id)
                .map(str::to_string);
            let due = self.fling.launch(direction, card_id, now_ms);
            debug!(
                "event=fling_start module=session direction={} due_at_ms={}",
                direction.label(),
                due
            );
        } else {
            self.apply_deferred_catalog();
        }
        Some(outcome)
    }

    /// Arrow keys swipe the top card immediately. Ignored while a drag or
    /// fling owns the top card. Returns whether the key was handled.
    pub fn handle_key(&mut self, key: KeyInput, now_ms: u64) -> bool {
        let Some(direction) = key.direction() else {
            return false;
        };
        if self.deck.is_empty()
            || self.fling.is_in_flight()
            || self.recognizer.phase() != GesturePhase::Idle
        {
            return false;
        }
        self.feedback.show_release(direction, now_ms);
        self.apply_swipe(direction).is_some()
    }

    /// Advances time: completes a due fling and expires feedback.
    pub fn tick(&mut self, now_ms: u64) -> Option<SwipeResolution> {
        self.feedback.expire(now_ms);
        let pending = self.fling.poll_due(now_ms)?;
        debug_assert_eq!(
            pending.card_id.as_deref(),
            self.deck.top().and_then(CardItem::tracked_id),
            "fling landed on a different card than it launched from"
        );
        let resolution = self.apply_swipe(pending.direction);
        self.apply_deferred_catalog();
        resolution
    }

    /// Applies cross-context changes to both stores. The stack is untouched.
    pub fn sync(&mut self) -> SyncReport {
        SyncReport {
            likes_changed: self.likes.sync(),
            seen_changed: self.seen.sync(),
        }
    }

    /// Clears the seen set; takes effect at the next catalog change.
    pub fn reset_seen(&mut self) {
        self.seen.reset();
    }

    pub fn render(&self, now_ms: u64) -> RenderFrame {
        let (start, visible) = self.deck.visible(self.config.visible_depth);
        let top_index = self.deck.len().checked_sub(1);
        let cards = visible
            .iter()
            .enumerate()
            .map(|(offset, card)| {
                let index = start + offset;
                let is_front = Some(index) == top_index;
                VisibleCard {
                    card: card.clone(),
                    role: if is_front {
                        CardRole::Front
                    } else {
                        CardRole::Back
                    },
                    index,
                    z_index: self.config.base_z_index + index as i32,
                    translate_y: if is_front {
                        0.0
                    } else {
                        self.config.back_card_offset_px
                    },
                    interactive: is_front,
                    visual: if is_front {
                        self.recognizer.visual()
                    } else {
                        CardVisual::at_rest()
                    },
                }
            })
            .collect();

        let live_glyph = if self.recognizer.is_dragging() {
            self.feedback
                .live(self.recognizer.drag().current_x, self.threshold())
        } else {
            None
        };

        RenderFrame {
            cards,
            live_glyph,
            release_glyph: self.feedback.release_glyph(now_ms),
            remaining: self.deck.len(),
        }
    }

    /// Two-phase swipe: commit the pop and notify deck observers, then run
    /// the queued store mutations.
    fn apply_swipe(&mut self, direction: SwipeDirection) -> Option<SwipeResolution> {
        let card = self.deck.pop()?;
        self.recognizer.reset();
        let remaining = self.deck.len();
        self.notify_deck(&DeckChange::Popped {
            card: card.clone(),
            direction,
            remaining,
        });

        if let Some(id) = card.tracked_id() {
            self.effects.extend(SideEffect::for_swipe(id, direction));
        }
        self.run_effects();

        info!(
            "event=swipe module=session status=ok direction={} tracked={} remaining={}",
            direction.label(),
            card.tracked_id().is_some(),
            remaining
        );
        Some(SwipeResolution {
            card,
            direction,
            remaining,
        })
    }

    fn run_effects(&mut self) {
        while let Some(effect) = self.effects.pop() {
            match effect {
                SideEffect::Like(id) => self.likes.like(&id),
                SideEffect::Unlike(id) => self.likes.unlike(&id),
                SideEffect::MarkSeen(id) => self.seen.mark_seen(&id),
            }
        }
    }

    fn apply_deferred_catalog(&mut self) {
        if let Some(catalog) = self.deferred_catalog.take() {
            self.set_catalog(&catalog);
        }
    }

    fn notify_deck(&mut self, change: &DeckChange) {
        for observer in self.deck_observers.iter_mut() {
            observer(change);
        }
    }
}
