//! Keyboard modifier state tracking.

use super::tool::Tool;

/// Keyboard modifier state.
///
/// Tracks which modifier keys are currently pressed. Used to pick the
/// pointer tool and to match keybindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Creates a new Modifiers instance with all keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift switches the pointer to [`Tool::Connect`].
    pub fn current_tool(&self) -> Tool {
        if self.shift {
            Tool::Connect
        } else {
            Tool::Select
        }
    }

    /// Whether a character key should be treated as a shortcut rather than
    /// label text.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.alt
    }
}
