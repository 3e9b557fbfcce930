//! Deck stack, shuffle and render contract.
//!
//! # Responsibility
//! - Build the working stack from a catalog minus the seen set.
//! - Pop the top card on a confirmed swipe.
//! - Describe what the presentation layer draws.
//!
//! # Invariants
//! - Seen filtering happens only when the stack is (re)built for a new
//!   catalog identity. Between rebuilds membership is frozen, so a card
//!   on top never disappears because the seen set changed.
//! - The top of the stack is the last element.

pub mod feedback;
pub mod render;
pub mod shuffle;
pub mod stack;

pub use feedback::GlyphFeedback;
pub use render::{CardRole, Glyph, GlyphKind, RenderFrame, VisibleCard};
pub use shuffle::fisher_yates;
pub use stack::DeckStack;
