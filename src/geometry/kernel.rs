//! Pure math shared by curve fitting, hit testing and rendering.

use super::Coordinate;
use std::f64::consts::TAU;

/// Determinant of the 3x3 matrix
///
/// ```text
/// | a b c |
/// | d e f |
/// | g h i |
/// ```
#[allow(clippy::too_many_arguments)]
pub fn determinant3x3(
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
) -> f64 {
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// A circle on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Circle {
    pub center: Coordinate,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Coordinate, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Point on the circle at `angle`.
    pub fn point_at(&self, angle: f64) -> Coordinate {
        self.center + Coordinate::from_angle(angle) * self.radius
    }

    /// Point on the circle closest to `toward`.
    ///
    /// Returns the center itself when `toward` coincides with it.
    pub fn closest_point(&self, toward: Coordinate) -> Coordinate {
        let delta = toward - self.center;
        let length = delta.length();
        if length <= f64::EPSILON {
            return self.center;
        }
        self.center + delta * (self.radius / length)
    }
}

/// Solves for the unique circle through three points.
///
/// Expanding `det(|x²+y² x y 1; s_i x_i y_i 1|) = 0` along its first row
/// gives `a(x²+y²) - bx·x + by·y - c = 0`, hence the center
/// `(bx / 2a, -by / 2a)` and `r² = cx² + cy² + c / a`.
///
/// Collinear points make `a` zero and the result non-finite. Callers fall
/// back to a straight edge before reaching this function.
pub fn circle_from_three_points(p1: Coordinate, p2: Coordinate, p3: Coordinate) -> Circle {
    let s1 = p1.length_squared();
    let s2 = p2.length_squared();
    let s3 = p3.length_squared();

    let a = determinant3x3(p1.x, p1.y, 1.0, p2.x, p2.y, 1.0, p3.x, p3.y, 1.0);
    let bx = determinant3x3(s1, p1.y, 1.0, s2, p2.y, 1.0, s3, p3.y, 1.0);
    let by = determinant3x3(s1, p1.x, 1.0, s2, p2.x, 1.0, s3, p3.x, 1.0);
    let c = determinant3x3(s1, p1.x, p1.y, s2, p2.x, p2.y, s3, p3.x, p3.y);

    let center = Coordinate::new(bx / (2.0 * a), -by / (2.0 * a));
    let radius = (center.x * center.x + center.y * center.y + c / a).sqrt();

    Circle { center, radius }
}

/// Wraps `angle` into `[start, start + 2π)`.
pub fn normalize_angle(angle: f64, start: f64) -> f64 {
    let wrapped = (angle - start).rem_euclid(TAU);
    start + wrapped
}

/// Returns `true` when `angle` lies strictly inside the arc swept from
/// `start` to `end` in the direction of increasing angle.
///
/// `end` is lifted by a full turn when it is numerically below `start`, and
/// `angle` is wrapped into the same window before the comparison.
pub fn angle_within_arc(angle: f64, start: f64, end: f64) -> bool {
    let end = if end < start { end + TAU } else { end };
    let mut angle = angle;
    if angle < start {
        angle += TAU;
    } else if angle > end {
        angle -= TAU;
    }
    angle > start && angle < end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-6;

    fn on_circle(center: Coordinate, radius: f64, angle: f64) -> Coordinate {
        center + Coordinate::from_angle(angle) * radius
    }

    #[test]
    fn determinant_of_identity_is_one() {
        assert_eq!(
            determinant3x3(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
            1.0
        );
        assert_eq!(
            determinant3x3(2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 2.0),
            6.0
        );
    }

    #[test]
    fn circle_recovered_from_acute_triple() {
        let center = Coordinate::new(120.0, -45.0);
        let radius = 37.5;
        let fit = circle_from_three_points(
            on_circle(center, radius, 0.2),
            on_circle(center, radius, 2.1),
            on_circle(center, radius, 4.0),
        );
        assert!((fit.center.x - center.x).abs() < EPS);
        assert!((fit.center.y - center.y).abs() < EPS);
        assert!((fit.radius - radius).abs() < EPS);
    }

    #[test]
    fn circle_recovered_from_obtuse_triple() {
        let center = Coordinate::new(-10.0, 300.0);
        let radius = 150.0;
        let fit = circle_from_three_points(
            on_circle(center, radius, 0.0),
            on_circle(center, radius, 0.3),
            on_circle(center, radius, 0.6),
        );
        assert!((fit.center.x - center.x).abs() < EPS);
        assert!((fit.center.y - center.y).abs() < EPS);
        assert!((fit.radius - radius).abs() < EPS);
    }

    #[test]
    fn collinear_points_are_not_finite() {
        let fit = circle_from_three_points(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(2.0, 2.0),
        );
        assert!(!fit.center.is_finite() || !fit.radius.is_finite());
    }

    #[test]
    fn normalize_angle_wraps_into_window() {
        let start = -PI / 2.0;
        let wrapped = normalize_angle(3.0 * PI, start);
        assert!(wrapped >= start && wrapped < start + TAU);
        assert!((wrapped - PI).abs() < EPS);
    }

    #[test]
    fn arc_containment_handles_wraparound() {
        // Arc from 170° to -170° passing through 180°.
        let start = 170f64.to_radians();
        let end = (-170f64).to_radians();
        assert!(angle_within_arc(PI, start, end));
        assert!(angle_within_arc(-PI + 0.05, start, end));
        assert!(!angle_within_arc(0.0, start, end));
    }
}
