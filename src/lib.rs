//! Geometry, hit testing and interaction engine for finite-state-machine
//! diagrams.
//!
//! A host (window or browser shell) feeds pointer and keyboard events into an
//! [`input::Drawer`] and supplies a [`draw::Renderer`]; the library keeps the
//! diagram model consistent, persists it and exports it.

pub mod config;
pub mod diagram;
pub mod draw;
pub mod export;
pub mod geometry;
pub mod input;
pub mod session;
pub mod ticker;

pub use config::Config;
