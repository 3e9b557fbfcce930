//! Heart/cross glyph feedback for drags and swipes.

use super::render::{Glyph, GlyphKind};
use crate::config::EngineConfig;
use crate::model::swipe::SwipeDirection;

const RELEASE_OPACITY: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct GlyphFeedback {
    live_min_px: f64,
    release_min_px: f64,
    release_ms: u64,
    release: Option<(SwipeDirection, u64)>,
}

impl GlyphFeedback {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            live_min_px: config.live_glyph_min_px,
            release_min_px: config.release_glyph_min_px,
            release_ms: config.release_glyph_ms,
            release: None,
        }
    }

    /// Glyph tracking an active drag; grows and fades in toward the threshold.
    pub fn live(&self, dx: f64, threshold: f64) -> Option<Glyph> {
        let abs = dx.abs();
        if abs <= self.live_min_px {
            return None;
        }
        let direction = SwipeDirection::from_dx(dx)?;
        let progress = (abs / threshold).clamp(0.0, 1.0);
        Some(Glyph {
            kind: GlyphKind::from(direction),
            direction,
            scale: 0.8 + 0.4 * progress,
            opacity: progress * 0.95,
        })
    }

    /// Starts the release glyph after a drag ended at `dx`, if it moved far enough.
    pub fn on_drag_end(&mut self, dx: f64, now_ms: u64) {
        if dx.abs() <= self.release_min_px {
            return;
        }
        if let Some(direction) = SwipeDirection::from_dx(dx) {
            self.show_release(direction, now_ms);
        }
    }

    pub fn show_release(&mut self, direction: SwipeDirection, now_ms: u64) {
        self.release = Some((direction, now_ms.saturating_add(self.release_ms)));
    }

    /// Clears an expired release glyph; returns whether one was cleared.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.release.is_some_and(|(_, until)| now_ms >= until) {
            self.release = None;
            return true;
        }
        false
    }

    pub fn release_glyph(&self, now_ms: u64) -> Option<Glyph> {
        let (direction, until) = self.release?;
        if now_ms >= until {
            return None;
        }
        Some(Glyph {
            kind: GlyphKind::from(direction),
            direction,
            scale: 1.0,
            opacity: RELEASE_OPACITY,
        })
    }
}
