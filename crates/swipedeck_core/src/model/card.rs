//! Card item model.
//!
//! # Responsibility
//! - Carry the identity used by seen/like tracking.
//! - Pass the presentation payload through untouched.
//!
//! # Invariants
//! - `id` values are unique within one catalog fetch.
//! - A missing or empty `id` makes the card untracked: it is never marked
//!   seen, never liked, and is shown again on every rebuild.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier shared with the catalog and the persisted sets.
pub type CardId = String;

/// One unit of content in the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    /// Opaque presentation data (title, images, links...).
    #[serde(default)]
    pub payload: Value,
}

impl CardItem {
    pub fn new(id: impl Into<CardId>, payload: Value) -> Self {
        Self {
            id: Some(id.into()),
            payload,
        }
    }

    /// Card without identity; it can be shown but never tracked.
    pub fn untracked(payload: Value) -> Self {
        Self { id: None, payload }
    }

    /// Returns the id when it can take part in seen/like tracking.
    pub fn tracked_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}
