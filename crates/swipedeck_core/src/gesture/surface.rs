//! Host input surface seam.
//!
//! The recognizer asks the host to route a pointer exclusively to the card
//! and to suppress text selection while a drag is active.

/// Host pointer identifier.
pub type PointerId = i32;

pub trait InputSurface {
    /// Routes every event of `pointer` to the dragged card.
    fn capture_pointer(&mut self, pointer: PointerId);
    fn release_pointer(&mut self, pointer: PointerId);
    /// Enables or disables incidental text selection globally.
    fn set_text_selection(&mut self, enabled: bool);
}

/// Surface for hosts without capture or selection control.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSurface;

impl InputSurface for DetachedSurface {
    fn capture_pointer(&mut self, _pointer: PointerId) {}

    fn release_pointer(&mut self, _pointer: PointerId) {}

    fn set_text_selection(&mut self, _enabled: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Capture(PointerId),
    Release(PointerId),
    TextSelection(bool),
}

/// Surface that records every request, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some pointer is captured right now.
    pub fn is_captured(&self) -> bool {
        let mut captured = false;
        for call in &self.calls {
            match call {
                SurfaceCall::Capture(_) => captured = true,
                SurfaceCall::Release(_) => captured = false,
                SurfaceCall::TextSelection(_) => {}
            }
        }
        captured
    }

    /// Last requested text-selection state; enabled when never touched.
    pub fn text_selection_enabled(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|call| match call {
                SurfaceCall::TextSelection(enabled) => Some(*enabled),
                _ => None,
            })
            .unwrap_or(true)
    }
}

impl InputSurface for RecordingSurface {
    fn capture_pointer(&mut self, pointer: PointerId) {
        self.calls.push(SurfaceCall::Capture(pointer));
    }

    fn release_pointer(&mut self, pointer: PointerId) {
        self.calls.push(SurfaceCall::Release(pointer));
    }

    fn set_text_selection(&mut self, enabled: bool) {
        self.calls.push(SurfaceCall::TextSelection(enabled));
    }
}
