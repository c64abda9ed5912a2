//! Transitions (directed edges) and their curve model.
//!
//! A transition's bend is stored relative to the straight edge between its
//! endpoints: `parallel_axis` is the projection of the user's anchor onto the
//! edge (as a fraction of its length) and `perpendicular_axis` the signed
//! sideways offset (same unit). Re-deriving the anchor from these two numbers
//! keeps the curve's shape when either endpoint moves.
//!
//! Self-loops ignore the axes and are parameterized by `self_angle` alone.

use super::state::StateId;
use crate::geometry::{Circle, Coordinate, angle_within_arc, circle_from_three_points};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

/// Default threshold below which `|perpendicular_axis|` snaps to straight.
pub const DEFAULT_MIN_PERPENDICULAR_DISTANCE: f64 = 0.02;

/// Half the angular span of a self-loop around its own center.
const SELF_LOOP_HALF_SPAN: f64 = 0.8 * PI;
/// Loop radius relative to the state radius.
const SELF_LOOP_RADIUS_FACTOR: f64 = 0.75;
/// Distance of the loop center from the state center, relative to the state radius.
const SELF_LOOP_CENTER_FACTOR: f64 = 1.5;
/// Self-loop angles within this many radians of a right angle snap onto it.
const RIGHT_ANGLE_SNAP: f64 = 0.1;

const DEGENERATE_LENGTH_SQUARED: f64 = 1e-9;
const AXIS_ALIGNED_EPSILON: f64 = 1e-9;

/// Stable identifier of a transition within one diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub u64);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// One end of a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endpoint {
    /// A real state in the diagram.
    State(StateId),
    /// A bare point with no state behind it. A marker on the `from` side
    /// renders as an incoming arrow and marks the target as initial.
    Marker(Coordinate),
}

impl Endpoint {
    pub fn state_id(&self) -> Option<StateId> {
        match self {
            Endpoint::State(id) => Some(*id),
            Endpoint::Marker(_) => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Endpoint::Marker(_))
    }

    /// Returns `true` when this endpoint is the given state.
    pub fn is_state(&self, id: StateId) -> bool {
        self.state_id() == Some(id)
    }
}

/// Which side of a transition an operation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

/// Position and direction for a transition label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelAnchor {
    /// Point on the drawn edge next to which the label sits
    pub position: Coordinate,
    /// Direction from the edge towards the label
    pub angle: f64,
}

/// A directed edge between two endpoints.
///
/// Endpoint circles are cached so that rendering and hit testing only read
/// fields; the owning [`super::FiniteStateMachine`] refreshes them whenever
/// a state moves or changes radius.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    id: TransitionId,
    from: Endpoint,
    to: Endpoint,
    /// Multi-line label
    pub text: String,
    parallel_axis: f64,
    perpendicular_axis: f64,
    min_perpendicular_distance: f64,
    is_reversed: bool,
    radius: f64,
    center_arc: Coordinate,
    self_angle: f64,
    drag_offset_angle: f64,
    from_circle: Circle,
    to_circle: Circle,
}

impl Transition {
    /// Creates a straight transition between two resolved endpoint circles.
    ///
    /// When both endpoints are the same state the transition starts out as a
    /// self-loop pointing straight up.
    pub fn new(
        id: TransitionId,
        from: Endpoint,
        to: Endpoint,
        from_circle: Circle,
        to_circle: Circle,
        min_perpendicular_distance: f64,
    ) -> Self {
        let mut transition = Self {
            id,
            from,
            to,
            text: String::new(),
            parallel_axis: 0.5,
            perpendicular_axis: 0.0,
            min_perpendicular_distance: min_perpendicular_distance.abs(),
            is_reversed: false,
            radius: 0.0,
            center_arc: Coordinate::ORIGIN,
            self_angle: -FRAC_PI_2,
            drag_offset_angle: 0.0,
            from_circle,
            to_circle,
        };
        transition.refresh();
        transition
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn from(&self) -> Endpoint {
        self.from
    }

    pub fn to(&self) -> Endpoint {
        self.to
    }

    /// Returns `true` if `state` is either endpoint.
    pub fn touches(&self, state: StateId) -> bool {
        self.from.is_state(state) || self.to.is_state(state)
    }

    pub fn is_self_loop(&self) -> bool {
        match (self.from, self.to) {
            (Endpoint::State(a), Endpoint::State(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_curved(&self) -> bool {
        self.is_self_loop() || self.perpendicular_axis.abs() >= self.min_perpendicular_distance
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn parallel_axis(&self) -> f64 {
        self.parallel_axis
    }

    pub fn perpendicular_axis(&self) -> f64 {
        self.perpendicular_axis
    }

    pub fn min_perpendicular_distance(&self) -> f64 {
        self.min_perpendicular_distance
    }

    pub fn set_min_perpendicular_distance(&mut self, value: f64) {
        self.min_perpendicular_distance = value.abs();
        self.refresh();
    }

    /// Radius of the drawn arc (0 for straight transitions).
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Center of the drawn arc (meaningless for straight transitions).
    pub fn center_arc(&self) -> Coordinate {
        self.center_arc
    }

    pub fn self_angle(&self) -> f64 {
        self.self_angle
    }

    pub fn from_circle(&self) -> Circle {
        self.from_circle
    }

    pub fn to_circle(&self) -> Circle {
        self.to_circle
    }

    /// Direction from `from` to `to`, or the loop direction for self-loops.
    pub fn angle(&self) -> f64 {
        if self.is_self_loop() {
            self.self_angle
        } else {
            (self.to_circle.center - self.from_circle.center).angle()
        }
    }

    /// Angle (around [`Self::center_arc`]) where the drawn arc starts.
    ///
    /// For straight transitions this is the direction from the source center
    /// to its touch point.
    pub fn from_angle(&self) -> f64 {
        if self.is_self_loop() {
            return self.self_angle - SELF_LOOP_HALF_SPAN;
        }
        if !self.is_curved() {
            return self.angle();
        }
        let base = (self.from_circle.center - self.center_arc).angle();
        base - self.reverse_scale() * self.from_circle.radius / self.radius
    }

    /// Angle (around [`Self::center_arc`]) where the drawn arc ends.
    ///
    /// For straight transitions this is the direction from the target center
    /// to its touch point.
    pub fn to_angle(&self) -> f64 {
        if self.is_self_loop() {
            return self.self_angle + SELF_LOOP_HALF_SPAN;
        }
        if !self.is_curved() {
            return self.angle() + PI;
        }
        let base = (self.to_circle.center - self.center_arc).angle();
        base + self.reverse_scale() * self.to_circle.radius / self.radius
    }

    /// Where the edge leaves the source circle.
    pub fn from_coord(&self) -> Coordinate {
        if self.is_curved() {
            self.arc().point_at(self.from_angle())
        } else {
            self.from_circle.center + Coordinate::from_angle(self.angle()) * self.from_circle.radius
        }
    }

    /// Where the edge meets the target circle.
    pub fn to_coord(&self) -> Coordinate {
        if self.is_curved() {
            self.arc().point_at(self.to_angle())
        } else {
            self.to_circle.center - Coordinate::from_angle(self.angle()) * self.to_circle.radius
        }
    }

    /// The arc the edge follows when curved.
    pub fn arc(&self) -> Circle {
        Circle::new(self.center_arc, self.radius)
    }

    /// The curvature control point reconstructed from the stored axes.
    ///
    /// For self-loops this is the apex of the loop.
    pub fn anchor(&self) -> Coordinate {
        if self.is_self_loop() {
            return self.arc().point_at(self.self_angle);
        }
        let origin = self.from_circle.center;
        let d = self.to_circle.center - origin;
        origin + d * self.parallel_axis + d.perpendicular() * self.perpendicular_axis
    }

    /// Tip of the arrowhead and the direction it points in.
    pub fn arrow_head(&self) -> (Coordinate, f64) {
        let tip = self.to_coord();
        let direction = if self.is_self_loop() {
            self.to_angle() + 0.4 * PI
        } else if self.is_curved() {
            self.to_angle() - self.reverse_scale() * FRAC_PI_2
        } else {
            (tip - self.from_coord()).angle()
        };
        (tip, direction)
    }

    /// Where the label of this transition should be placed.
    pub fn label_anchor(&self) -> LabelAnchor {
        if self.is_self_loop() {
            return LabelAnchor {
                position: self.arc().point_at(self.self_angle),
                angle: self.self_angle,
            };
        }
        if self.is_curved() {
            let start = self.from_angle();
            let mut end = self.to_angle();
            if end < start {
                end += TAU;
            }
            let mut angle = (start + end) / 2.0;
            if self.is_reversed {
                angle += PI;
            }
            return LabelAnchor {
                position: self.arc().point_at(angle),
                angle,
            };
        }
        let start = self.from_coord();
        let end = self.to_coord();
        LabelAnchor {
            position: (start + end) * 0.5,
            angle: (end.x - start.x).atan2(start.y - end.y),
        }
    }

    /// Bends the transition so that it passes through `anchor`.
    ///
    /// Small perpendicular offsets snap back to a straight edge. Self-loops
    /// rotate towards `anchor` instead.
    pub fn curve_to(&mut self, anchor: Coordinate) {
        if self.is_self_loop() {
            self.update_self_transition(anchor);
            return;
        }

        let origin = self.from_circle.center;
        let d = self.to_circle.center - origin;
        let scale = d.length_squared();
        if scale < DEGENERATE_LENGTH_SQUARED {
            self.make_straight();
            return;
        }

        let d2 = anchor - origin;
        self.parallel_axis = d.dot(d2) / scale;
        self.perpendicular_axis = d.cross(d2) / scale;
        self.is_reversed = self.perpendicular_axis > 0.0;
        self.refresh();
    }

    /// Removes any bend.
    pub fn make_straight(&mut self) {
        self.perpendicular_axis = 0.0;
        self.is_reversed = false;
        self.radius = 0.0;
    }

    /// Remembers the angular offset between the loop and the cursor so a
    /// later [`Self::update_self_transition`] does not jump.
    pub fn begin_self_loop_drag(&mut self, cursor: Coordinate) {
        let cursor_angle = (cursor - self.from_circle.center).angle();
        self.drag_offset_angle = self.self_angle - cursor_angle;
    }

    /// Rotates a self-loop to follow `cursor`, snapping to the nearest right
    /// angle when close to one.
    pub fn update_self_transition(&mut self, cursor: Coordinate) {
        let raw = (cursor - self.from_circle.center).angle() + self.drag_offset_angle;
        let snap = (raw / FRAC_PI_2).round() * FRAC_PI_2;
        let mut angle = if (raw - snap).abs() < RIGHT_ANGLE_SNAP {
            snap
        } else {
            raw
        };
        if angle < -PI {
            angle += TAU;
        }
        if angle > PI {
            angle -= TAU;
        }
        self.set_self_angle(angle);
    }

    /// Points the self-loop at `angle` (radians, y-down).
    pub fn set_self_angle(&mut self, angle: f64) {
        self.self_angle = angle;
        if self.is_self_loop() {
            self.refresh_self_loop();
        }
    }

    /// Replaces the cached endpoint circles and recomputes the curve.
    pub fn sync_endpoints(&mut self, from_circle: Circle, to_circle: Circle) {
        self.from_circle = from_circle;
        self.to_circle = to_circle;
        self.refresh();
    }

    /// Mutable access to a marker endpoint's position.
    ///
    /// Callers must follow up with [`Self::sync_endpoints`].
    pub fn marker_mut(&mut self, side: Side) -> Option<&mut Coordinate> {
        let endpoint = match side {
            Side::From => &mut self.from,
            Side::To => &mut self.to,
        };
        match endpoint {
            Endpoint::Marker(coordinate) => Some(coordinate),
            Endpoint::State(_) => None,
        }
    }

    /// Restores persisted curve parameters and recomputes the cached arc.
    pub(crate) fn restore_curve(
        &mut self,
        parallel_axis: f64,
        perpendicular_axis: f64,
        self_angle: f64,
    ) {
        self.parallel_axis = parallel_axis;
        self.perpendicular_axis = perpendicular_axis;
        self.is_reversed = perpendicular_axis > 0.0;
        self.self_angle = self_angle;
        self.refresh();
    }

    /// Distance-based hit test.
    ///
    /// `tolerance` is the allowed distance in pixels between `point` and the
    /// drawn edge.
    pub fn hit_test(&self, point: Coordinate, tolerance: f64) -> bool {
        if self.is_curved() {
            self.hit_test_arc(point, tolerance)
        } else {
            self.hit_test_straight(point, tolerance)
        }
    }

    fn hit_test_arc(&self, point: Coordinate, tolerance: f64) -> bool {
        let delta = point - self.center_arc;
        let distance_from_arc = delta.length() - self.radius;
        if distance_from_arc.abs() > tolerance {
            return false;
        }
        let (start, end) = if self.is_reversed {
            (self.to_angle(), self.from_angle())
        } else {
            (self.from_angle(), self.to_angle())
        };
        angle_within_arc(delta.angle(), start, end)
    }

    fn hit_test_straight(&self, point: Coordinate, tolerance: f64) -> bool {
        let start = self.from_coord();
        let end = self.to_coord();
        let d = end - start;
        let length_squared = d.length_squared();
        if length_squared < DEGENERATE_LENGTH_SQUARED {
            return point.distance_squared(start) <= tolerance * tolerance;
        }

        // Foot of the perpendicular dropped from `point` onto the line.
        let foot = if d.x.abs() < AXIS_ALIGNED_EPSILON {
            Coordinate::new(start.x, point.y)
        } else if d.y.abs() < AXIS_ALIGNED_EPSILON {
            Coordinate::new(point.x, start.y)
        } else {
            let slope = d.y / d.x;
            let normal_slope = -1.0 / slope;
            let x = (slope * start.x - normal_slope * point.x + point.y - start.y)
                / (slope - normal_slope);
            Coordinate::new(x, slope * (x - start.x) + start.y)
        };

        point.distance_squared(foot) <= tolerance * tolerance
    }

    fn reverse_scale(&self) -> f64 {
        if self.is_reversed { 1.0 } else { -1.0 }
    }

    fn refresh(&mut self) {
        if self.is_self_loop() {
            self.refresh_self_loop();
            return;
        }
        if self.perpendicular_axis.abs() < self.min_perpendicular_distance {
            self.make_straight();
            return;
        }
        if (self.to_circle.center - self.from_circle.center).length_squared()
            < DEGENERATE_LENGTH_SQUARED
        {
            // Coincident endpoints have no arc through them. Keep the axes so
            // the curve comes back once they separate, and hold the last fit.
            if !(self.radius.is_finite() && self.radius > 0.0) {
                self.center_arc = self.from_circle.center;
                self.radius = self.from_circle.radius.max(1.0);
            }
            return;
        }

        let fit = circle_from_three_points(
            self.from_circle.center,
            self.to_circle.center,
            self.anchor(),
        );
        if fit.center.is_finite() && fit.radius.is_finite() && fit.radius > 0.0 {
            self.center_arc = fit.center;
            self.radius = fit.radius;
        } else {
            self.make_straight();
        }
    }

    fn refresh_self_loop(&mut self) {
        let state = self.from_circle;
        self.center_arc = state.center
            + Coordinate::from_angle(self.self_angle) * (SELF_LOOP_CENTER_FACTOR * state.radius);
        self.radius = SELF_LOOP_RADIUS_FACTOR * state.radius;
        self.is_reversed = false;
    }
}
