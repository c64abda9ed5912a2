//! Pointer tool selection.

/// What a left-button drag does.
///
/// Tools are selected by holding modifier keys while pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Click to create/select, drag to move, resize or bend (no modifier)
    Select,
    /// Drag from a state or empty space to connect (Shift)
    Connect,
}
