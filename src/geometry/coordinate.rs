//! 2D coordinate value type.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A point on the canvas, or a delta between two points.
///
/// Canvas space is y-down: positive `y` points towards the bottom of the
/// screen, so positive angles from [`Coordinate::angle`] turn clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Returns a copy with both components clamped to be non-negative.
    ///
    /// Canvas positions are never negative; deltas should not be clamped.
    pub fn clamped(self) -> Self {
        Self::new(self.x.max(0.0), self.y.max(0.0))
    }

    /// Returns a copy shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn dot(self, other: Coordinate) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product `self × other`.
    pub fn cross(self, other: Coordinate) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: Coordinate) -> f64 {
        (self - other).length_squared()
    }

    pub fn distance(self, other: Coordinate) -> f64 {
        (self - other).length()
    }

    /// Direction of this vector, `atan2(y, x)`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// The vector rotated a quarter turn: `(-y, x)`.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Coordinate {
    fn add_assign(&mut self, rhs: Coordinate) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Coordinate {
    fn sub_assign(&mut self, rhs: Coordinate) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Component-wise product.
impl Mul for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Mul<f64> for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: f64) -> Coordinate {
        Coordinate::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;

    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_drops_negative_components() {
        let c = Coordinate::new(-4.0, 12.5).clamped();
        assert_eq!(c, Coordinate::new(0.0, 12.5));
    }

    #[test]
    fn arithmetic_is_component_wise() {
        let a = Coordinate::new(3.0, 4.0);
        let b = Coordinate::new(1.0, -2.0);
        assert_eq!(a + b, Coordinate::new(4.0, 2.0));
        assert_eq!(a - b, Coordinate::new(2.0, 6.0));
        assert_eq!(a * b, Coordinate::new(3.0, -8.0));
        assert_eq!(a * 2.0, Coordinate::new(6.0, 8.0));
        assert_eq!(a.length(), 5.0);
    }

    #[test]
    fn cross_sign_follows_y_down_convention() {
        let along = Coordinate::new(100.0, 0.0);
        let below = Coordinate::new(50.0, 30.0);
        assert!(along.cross(below) > 0.0);
        assert!(along.cross(Coordinate::new(50.0, -30.0)) < 0.0);
    }
}
