//! Flutter-facing bindings for the swipe deck engine.

pub mod api;
