//! Render contract consumed by the presentation layer.

use crate::gesture::CardVisual;
use crate::model::card::CardItem;
use crate::model::swipe::SwipeDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRole {
    /// Top card; receives pointer input.
    Front,
    /// Inert preview directly beneath the front card.
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCard {
    pub card: CardItem,
    pub role: CardRole,
    /// Position in the stack, bottom = 0.
    pub index: usize,
    pub z_index: i32,
    /// Resting vertical offset; back cards sit lower and rise when promoted.
    pub translate_y: f64,
    pub interactive: bool,
    pub visual: CardVisual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Heart,
    Cross,
}

impl From<SwipeDirection> for GlyphKind {
    fn from(value: SwipeDirection) -> Self {
        match value {
            SwipeDirection::Left => Self::Heart,
            SwipeDirection::Right => Self::Cross,
        }
    }
}

/// Directional feedback overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub kind: GlyphKind,
    pub direction: SwipeDirection,
    pub scale: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    /// Bottom-most first; the front card, when present, is last.
    pub cards: Vec<VisibleCard>,
    /// Follows an active drag.
    pub live_glyph: Option<Glyph>,
    /// Plays after a drag release or keyboard swipe.
    pub release_glyph: Option<Glyph>,
    pub remaining: usize,
}

impl RenderFrame {
    pub fn front(&self) -> Option<&VisibleCard> {
        self.cards.iter().find(|card| card.role == CardRole::Front)
    }

    pub fn back(&self) -> Option<&VisibleCard> {
        self.cards.iter().find(|card| card.role == CardRole::Back)
    }
}
