//! Swipe gesture state machine.
//!
//! `Idle -> Dragging -> (Flinging | Idle)`. A swipe parks the recognizer in
//! `Flinging` until the owner resets it for the next top card; a snap-back
//! returns straight to `Idle`.

use super::surface::{InputSurface, PointerId};
use crate::config::EngineConfig;
use crate::fling::FlingTiming;
use crate::model::swipe::SwipeDirection;

/// Viewport the deck is rendered in. Width is unknown before layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: Option<f64>,
}

impl Viewport {
    pub fn with_width(width: f64) -> Self {
        Self { width: Some(width) }
    }
}

/// Threshold and fling geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureParams {
    pub threshold_max_px: f64,
    pub threshold_viewport_ratio: f64,
    pub fallback_threshold_px: f64,
    pub fling_overshoot_px: f64,
    pub rotation_divisor: f64,
}

impl GestureParams {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            threshold_max_px: config.threshold_max_px,
            threshold_viewport_ratio: config.threshold_viewport_ratio,
            fallback_threshold_px: config.fallback_threshold_px,
            fling_overshoot_px: config.fling_overshoot_px,
            rotation_divisor: config.rotation_divisor,
        }
    }

    /// `T = min(threshold_max_px, ratio * width)`.
    pub fn threshold(&self, viewport: Viewport) -> f64 {
        match viewport.width {
            Some(width) => self
                .threshold_max_px
                .min(self.threshold_viewport_ratio * width),
            None => self.fallback_threshold_px,
        }
    }

    fn rotation(&self, dx: f64) -> f64 {
        dx / self.rotation_divisor
    }
}

impl Default for GestureParams {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Per-gesture drag record. `current_*` is the displacement from origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    pub origin_x: f64,
    pub origin_y: f64,
    pub current_x: f64,
    pub current_y: f64,
    pub active: bool,
}

/// Transform the presentation layer applies to the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardVisual {
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    /// `None` while following the pointer; the fling duration otherwise.
    pub transition_ms: Option<u64>,
}

impl CardVisual {
    pub fn at_rest() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            rotation_deg: 0.0,
            opacity: 1.0,
            transition_ms: None,
        }
    }
}

impl Default for CardVisual {
    fn default() -> Self {
        Self::at_rest()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    /// Swipe decided; the card is animating off-screen.
    Flinging(SwipeDirection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Up,
    Cancel,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    Swipe {
        direction: SwipeDirection,
        /// Horizontal displacement at release.
        dx: f64,
        visual: CardVisual,
    },
    SnapBack {
        dx: f64,
        visual: CardVisual,
    },
}

impl GestureOutcome {
    pub fn dx(&self) -> f64 {
        match self {
            Self::Swipe { dx, .. } | Self::SnapBack { dx, .. } => *dx,
        }
    }

    pub fn direction(&self) -> Option<SwipeDirection> {
        match self {
            Self::Swipe { direction, .. } => Some(*direction),
            Self::SnapBack { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct GestureRecognizer {
    params: GestureParams,
    timing: FlingTiming,
    phase: GesturePhase,
    drag: DragState,
    pointer: Option<PointerId>,
    visual: CardVisual,
}

impl GestureRecognizer {
    pub fn new(params: GestureParams, timing: FlingTiming) -> Self {
        Self {
            params,
            timing,
            phase: GesturePhase::Idle,
            drag: DragState::default(),
            pointer: None,
            visual: CardVisual::at_rest(),
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn visual(&self) -> CardVisual {
        self.visual
    }

    pub fn params(&self) -> GestureParams {
        self.params
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == GesturePhase::Dragging
    }

    /// Starts a drag. Ignored unless idle, so a second pointer or a card
    /// already flinging cannot start another gesture.
    pub fn pointer_down(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        x: f64,
        y: f64,
    ) -> bool {
        if self.phase != GesturePhase::Idle {
            return false;
        }
        surface.capture_pointer(pointer);
        surface.set_text_selection(false);

        // Resume from the current displacement so a grab during a snap-back
        // does not jump.
        self.drag = DragState {
            origin_x: x - self.drag.current_x,
            origin_y: y - self.drag.current_y,
            current_x: self.drag.current_x,
            current_y: self.drag.current_y,
            active: true,
        };
        self.pointer = Some(pointer);
        self.phase = GesturePhase::Dragging;
        true
    }

    /// Follows the pointer with zero buffering. Returns the new visual.
    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64) -> Option<CardVisual> {
        if self.phase != GesturePhase::Dragging || self.pointer != Some(pointer) {
            return None;
        }
        self.drag.current_x = x - self.drag.origin_x;
        self.drag.current_y = y - self.drag.origin_y;
        self.visual = CardVisual {
            offset_x: self.drag.current_x,
            offset_y: self.drag.current_y,
            rotation_deg: self.params.rotation(self.drag.current_x),
            opacity: 1.0,
            transition_ms: None,
        };
        Some(self.visual)
    }

    /// Resolves the drag by horizontal displacement. Up, cancel and leave
    /// behave identically.
    pub fn release(
        &mut self,
        surface: &mut dyn InputSurface,
        pointer: PointerId,
        _kind: ReleaseKind,
        viewport: Viewport,
    ) -> Option<GestureOutcome> {
        if self.phase != GesturePhase::Dragging || self.pointer != Some(pointer) {
            return None;
        }
        surface.release_pointer(pointer);
        surface.set_text_selection(true);
        self.pointer = None;
        self.drag.active = false;

        let dx = self.drag.current_x;
        let dy = self.drag.current_y;
        let threshold = self.params.threshold(viewport);
        let transition = Some(self.timing.transition_ms());

        match SwipeDirection::from_dx(dx).filter(|_| dx.abs() > threshold) {
            Some(direction) => {
                let target_x = direction.sign()
                    * (viewport.width.unwrap_or(0.0) + self.params.fling_overshoot_px);
                self.visual = CardVisual {
                    offset_x: target_x,
                    offset_y: dy,
                    rotation_deg: self.params.rotation(target_x),
                    opacity: 1.0,
                    transition_ms: transition,
                };
                self.phase = GesturePhase::Flinging(direction);
                Some(GestureOutcome::Swipe {
                    direction,
                    dx,
                    visual: self.visual,
                })
            }
            None => {
                self.drag.current_x = 0.0;
                self.drag.current_y = 0.0;
                self.visual = CardVisual {
                    transition_ms: transition,
                    ..CardVisual::at_rest()
                };
                self.phase = GesturePhase::Idle;
                Some(GestureOutcome::SnapBack {
                    dx,
                    visual: self.visual,
                })
            }
        }
    }

    /// Prepares for a new top card. Drops any drag without touching the
    /// surface; callers reset only when no pointer is captured.
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.drag = DragState::default();
        self.pointer = None;
        self.visual = CardVisual::at_rest();
    }
}
