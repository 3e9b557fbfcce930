//! Domain model shared by stores, deck and gesture code.
//!
//! # Invariants
//! - A card is tracked by seen/like logic only through a non-empty `id`.
//! - Swipe direction maps to exactly one preference action.

pub mod card;
pub mod swipe;
