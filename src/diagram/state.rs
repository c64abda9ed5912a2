//! Finite state (diagram node) definition.

use crate::geometry::{Circle, Coordinate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Radius used when a state is given a negative or non-finite radius.
pub const FALLBACK_STATE_RADIUS: f64 = 10.0;

/// Stable identifier of a state within one diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A node of the diagram, drawn as a circle (double circle when final).
///
/// Equality compares every observable field, including the id.
#[derive(Clone, Debug, PartialEq)]
pub struct FiniteState {
    id: StateId,
    coordinate: Coordinate,
    radius: f64,
    is_final: bool,
    /// Multi-line label
    pub text: String,
}

impl FiniteState {
    /// Creates a state centered on `coordinate`.
    ///
    /// A negative (or NaN) `radius` falls back to [`FALLBACK_STATE_RADIUS`].
    pub fn new(id: StateId, coordinate: Coordinate, radius: f64) -> Self {
        Self {
            id,
            coordinate,
            radius: sanitize_radius(radius),
            is_final: false,
            text: String::new(),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = coordinate;
    }

    /// Translates the state in place.
    pub fn move_by(&mut self, delta: Coordinate) {
        self.coordinate += delta;
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.radius = sanitize_radius(radius);
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }

    /// Flips the final flag and returns the new value.
    pub fn toggle_final(&mut self) -> bool {
        self.is_final = !self.is_final;
        self.is_final
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.coordinate, self.radius)
    }

    /// Point-in-circle test (boundary inclusive).
    pub fn contains(&self, point: Coordinate) -> bool {
        self.coordinate.distance_squared(point) <= self.radius * self.radius
    }
}

fn sanitize_radius(radius: f64) -> f64 {
    if radius >= 0.0 && radius.is_finite() {
        radius
    } else {
        FALLBACK_STATE_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_radius_falls_back_to_default() {
        let state = FiniteState::new(StateId(1), Coordinate::new(5.0, 5.0), -3.0);
        assert_eq!(state.radius(), FALLBACK_STATE_RADIUS);

        let mut state = FiniteState::new(StateId(2), Coordinate::ORIGIN, 0.0);
        assert_eq!(state.radius(), 0.0);
        state.set_radius(f64::NAN);
        assert_eq!(state.radius(), FALLBACK_STATE_RADIUS);
    }

    #[test]
    fn move_by_translates_in_place() {
        let mut state = FiniteState::new(StateId(1), Coordinate::new(10.0, 20.0), 15.0);
        state.move_by(Coordinate::new(-5.0, 2.5));
        assert_eq!(state.coordinate(), Coordinate::new(5.0, 22.5));
    }

    #[test]
    fn contains_is_point_in_circle() {
        let state = FiniteState::new(StateId(1), Coordinate::new(50.0, 50.0), 20.0);
        assert!(state.contains(Coordinate::new(50.0, 50.0)));
        assert!(state.contains(Coordinate::new(69.0, 50.0)));
        assert!(state.contains(Coordinate::new(70.0, 50.0)));
        assert!(!state.contains(Coordinate::new(65.0, 65.0)));
    }

    #[test]
    fn equality_is_by_value() {
        let a = FiniteState::new(StateId(3), Coordinate::new(1.0, 2.0), 12.0);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.text.push('q');
        assert_ne!(a, b);
    }
}
