//! Core use-case services.
//!
//! # Responsibility
//! - Compose stores, deck, gesture and fling timing into one session.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod effects;
pub mod swipe_session;
