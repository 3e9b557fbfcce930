//! Engine configuration.
//!
//! # Responsibility
//! - Hold every swipe/deck tunable in one place.
//! - Parse partial JSON overrides on top of defaults.
//!
//! # Invariants
//! - `fling_ms` is the only source for both the fling transition duration
//!   and the delay before the logical pop. Nothing else may hardcode it.
//! - Liked and seen sets live under distinct, non-empty storage keys.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_LIKES_KEY: &str = "gc_likes_v1";
pub const DEFAULT_SEEN_KEY: &str = "gc_seen_v1";

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "engine config is not valid JSON: {err}"),
            Self::Invalid { field, reason } => write!(f, "engine config `{field}` {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for gesture, fling, deck rendering and persistence keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fling/snap-back transition duration and pop delay, in milliseconds.
    pub fling_ms: u64,
    pub threshold_max_px: f64,
    pub threshold_viewport_ratio: f64,
    /// Threshold used when the viewport width is unknown.
    pub fallback_threshold_px: f64,
    /// Distance past the viewport edge a flung card travels to.
    pub fling_overshoot_px: f64,
    /// `rotation_deg = dx / rotation_divisor`.
    pub rotation_divisor: f64,
    pub back_card_offset_px: f64,
    /// Number of cards rendered from the top of the stack.
    pub visible_depth: usize,
    pub base_z_index: i32,
    pub live_glyph_min_px: f64,
    pub release_glyph_min_px: f64,
    pub release_glyph_ms: u64,
    pub likes_key: String,
    pub seen_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fling_ms: 320,
            threshold_max_px: 220.0,
            threshold_viewport_ratio: 0.28,
            fallback_threshold_px: 200.0,
            fling_overshoot_px: 400.0,
            rotation_divisor: 20.0,
            back_card_offset_px: 12.0,
            visible_depth: 2,
            base_z_index: 100,
            live_glyph_min_px: 6.0,
            release_glyph_min_px: 25.0,
            release_glyph_ms: 380,
            likes_key: DEFAULT_LIKES_KEY.to_string(),
            seen_key: DEFAULT_SEEN_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON object over defaults and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fling_ms == 0 {
            return Err(invalid("fling_ms", "must be greater than zero"));
        }
        positive("threshold_max_px", self.threshold_max_px)?;
        positive("threshold_viewport_ratio", self.threshold_viewport_ratio)?;
        positive("fallback_threshold_px", self.fallback_threshold_px)?;
        positive("rotation_divisor", self.rotation_divisor)?;
        if self.fling_overshoot_px < 0.0 {
            return Err(invalid("fling_overshoot_px", "must not be negative"));
        }
        if self.visible_depth == 0 {
            return Err(invalid("visible_depth", "must be at least 1"));
        }
        if self.likes_key.trim().is_empty() {
            return Err(invalid("likes_key", "cannot be empty"));
        }
        if self.seen_key.trim().is_empty() {
            return Err(invalid("seen_key", "cannot be empty"));
        }
        if self.likes_key == self.seen_key {
            return Err(invalid("seen_key", "must differ from likes_key"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite positive number"))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
