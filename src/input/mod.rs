//! Input handling and the interaction state machine.
//!
//! This module translates host keyboard and mouse events into diagram edits.
//! It tracks the current selection and drag gesture, applies label edits and
//! issues frames to a [`crate::draw::Renderer`].

pub mod events;
pub mod modifiers;
pub mod state;
pub mod text;
pub mod tool;

pub use events::{Key, MouseButton};
pub use modifiers::Modifiers;
pub use state::{Drag, Drawer, DrawerSettings, DrawingState};
pub use text::ScriptMode;
pub use tool::Tool;
