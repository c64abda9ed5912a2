//! Generic input event types for host-independent input handling.

/// Generic key representation.
///
/// Hosts map their native key codes to these values before handing them to
/// the [`Drawer`](super::Drawer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Regular character key (letters, digits, symbols, backslash)
    Char(char),
    Escape,
    /// Return/Enter key (newline while editing a label)
    Return,
    /// Removes the last label character
    Backspace,
    /// Delete key (removes the selection)
    Delete,
    Space,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Ctrl,
    Alt,
    /// Unmapped or unrecognized key
    Unknown,
}

impl Key {
    /// Name used for keybinding lookup, if the key can be bound.
    pub fn binding_name(&self) -> Option<String> {
        let name = match self {
            Key::Char(c) => return Some(c.to_string()),
            Key::Escape => "Escape",
            Key::Return => "Return",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Space => "Space",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Shift | Key::Ctrl | Key::Alt | Key::Unknown => return None,
        };
        Some(name.to_string())
    }
}

/// Mouse button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button: select, drag, connect
    Left,
    /// Cancels the gesture in progress
    Right,
    Middle,
}
