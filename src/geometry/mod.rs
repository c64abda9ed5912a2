//! Plane geometry used by the diagram model.
//!
//! - [`Coordinate`]: 2D point / vector value with component-wise arithmetic
//! - [`kernel`]: determinant, circle-through-three-points and angle helpers

pub mod coordinate;
pub mod kernel;

pub use coordinate::Coordinate;
pub use kernel::{
    Circle, angle_within_arc, circle_from_three_points, determinant3x3, normalize_angle,
};
