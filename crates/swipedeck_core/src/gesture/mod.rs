//! Pointer gesture recognition for the interactive top card.
//!
//! # Responsibility
//! - Turn a pointer-down/move/up stream into swipe-left, swipe-right or
//!   snap-back.
//! - Produce the card's continuous visual offset and rotation.
//!
//! # Invariants
//! - Strictly greater than the threshold swipes; equal snaps back.
//! - Cancel and leave resolve exactly like pointer-up.
//! - Input capture is released before the outcome animation starts.

pub mod recognizer;
pub mod surface;

pub use recognizer::{
    CardVisual, DragState, GestureOutcome, GestureParams, GesturePhase, GestureRecognizer,
    ReleaseKind, Viewport,
};
pub use surface::{DetachedSurface, InputSurface, PointerId, RecordingSurface, SurfaceCall};
