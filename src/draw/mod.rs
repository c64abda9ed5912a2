//! Rendering: the [`Renderer`] contract and its Cairo implementation.
//!
//! - [`Color`]: RGBA color representation with the named palette
//! - [`Renderer`]: what the interaction layer needs from a drawing surface
//! - [`CairoRenderer`]: draws states, transitions and labels with Cairo/Pango
//! - [`render_diagram`]: one ordered frame over a whole diagram

pub mod color;
pub mod font;
pub mod render;
pub mod renderer;

pub use color::Color;
pub use font::FontDescriptor;
pub use render::{CairoRenderer, RenderStyle};
pub use renderer::{Highlight, Palette, Renderer, render_diagram};

pub use color::{BLACK, BLUE, GRAY, GREEN, RED, TRANSPARENT, WHITE};
