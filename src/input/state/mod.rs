mod actions;
mod core;
mod mouse;
mod render;

pub use core::{Drag, Drawer, DrawerSettings, DrawingState};
