//! Swipe direction and its fixed preference mapping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Preference mutation applied to the liked set after a confirmed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAction {
    Like,
    Unlike,
}

impl SwipeDirection {
    /// Direction of a horizontal displacement; `None` for zero.
    pub fn from_dx(dx: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(Self::Right)
        } else if dx < 0.0 {
            Some(Self::Left)
        } else {
            None
        }
    }

    /// `-1.0` for left, `1.0` for right.
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Left likes, right passes. Product decision, not derived from data.
    pub fn action(self) -> SwipeAction {
        match self {
            Self::Left => SwipeAction::Like,
            Self::Right => SwipeAction::Unlike,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}
