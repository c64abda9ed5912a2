//! The diagram model: ordered state/transition stores and hit testing.

use super::state::{FiniteState, StateId};
use super::transition::{Endpoint, Side, Transition, TransitionId};
use crate::geometry::{Circle, Coordinate};
use log::debug;
use thiserror::Error;

/// Default pixel tolerance for [`FiniteStateMachine::find_transition`].
pub const DEFAULT_TRANSITION_SEARCH_RADIUS: f64 = 6.0;

/// Descriptive metadata carried alongside the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramInfo {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
}

impl Default for DiagramInfo {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Untitled".to_string(),
            description: String::new(),
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Errors raised when a mutation would break the model's invariants.
#[derive(Debug, Error, PartialEq)]
pub enum DiagramError {
    #[error("state {0} does not exist")]
    UnknownState(StateId),

    #[error("a transition needs at least one real state as an endpoint")]
    NoStateEndpoint,

    #[error("{0} is already in use")]
    DuplicateTransition(TransitionId),
}

/// Owns every state and transition of one diagram.
///
/// Both stores keep insertion order, which is also the draw order and the
/// tie-break order for hit testing.
#[derive(Debug, Clone)]
pub struct FiniteStateMachine {
    states: Vec<FiniteState>,
    transitions: Vec<Transition>,
    pub info: DiagramInfo,
    /// Pixel tolerance for transition hit testing
    pub transition_search_radius: f64,
    next_state_id: u64,
    next_transition_id: u64,
}

impl Default for FiniteStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FiniteStateMachine {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            info: DiagramInfo::default(),
            transition_search_radius: DEFAULT_TRANSITION_SEARCH_RADIUS,
            next_state_id: 1,
            next_transition_id: 1,
        }
    }

    pub fn states(&self) -> &[FiniteState] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }

    pub fn state(&self, id: StateId) -> Option<&FiniteState> {
        self.states.iter().find(|state| state.id() == id)
    }

    /// Mutable access for label edits and flags.
    ///
    /// Geometry changes should go through [`Self::move_state_to`] or
    /// [`Self::set_state_radius`] so attached transitions follow.
    pub fn state_mut(&mut self, id: StateId) -> Option<&mut FiniteState> {
        self.states.iter_mut().find(|state| state.id() == id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|transition| transition.id() == id)
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.transitions
            .iter_mut()
            .find(|transition| transition.id() == id)
    }

    /// Reserves a fresh state id. Ids are never handed out twice.
    pub fn allocate_state_id(&mut self) -> StateId {
        let id = StateId(self.next_state_id);
        self.next_state_id += 1;
        id
    }

    /// Reserves a fresh transition id. Ids are never handed out twice.
    pub fn allocate_transition_id(&mut self) -> TransitionId {
        let id = TransitionId(self.next_transition_id);
        self.next_transition_id += 1;
        id
    }

    /// Appends a state. If its id was not allocated here, later allocations
    /// skip past it.
    pub fn add_state(&mut self, state: FiniteState) -> StateId {
        let id = state.id();
        self.next_state_id = self.next_state_id.max(id.0 + 1);
        self.states.push(state);
        id
    }

    /// Circle an endpoint occupies: the state's circle, or a zero-radius
    /// circle for a marker.
    pub fn resolve_endpoint(&self, endpoint: Endpoint) -> Option<Circle> {
        match endpoint {
            Endpoint::State(id) => self.state(id).map(FiniteState::circle),
            Endpoint::Marker(coordinate) => Some(Circle::new(coordinate, 0.0)),
        }
    }

    /// Builds (but does not add) a straight transition between two endpoints.
    pub fn build_transition(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        min_perpendicular_distance: f64,
    ) -> Result<Transition, DiagramError> {
        let (from_circle, to_circle) = self.resolve_pair(from, to)?;
        let id = self.allocate_transition_id();
        Ok(Transition::new(
            id,
            from,
            to,
            from_circle,
            to_circle,
            min_perpendicular_distance,
        ))
    }

    /// Appends a transition after checking that its endpoints resolve.
    pub fn add_transition(&mut self, mut transition: Transition) -> Result<TransitionId, DiagramError> {
        let id = transition.id();
        if self.transition(id).is_some() {
            return Err(DiagramError::DuplicateTransition(id));
        }
        let (from_circle, to_circle) = self.resolve_pair(transition.from(), transition.to())?;
        transition.sync_endpoints(from_circle, to_circle);
        self.next_transition_id = self.next_transition_id.max(id.0 + 1);
        self.transitions.push(transition);
        Ok(id)
    }

    fn resolve_pair(&self, from: Endpoint, to: Endpoint) -> Result<(Circle, Circle), DiagramError> {
        if from.is_marker() && to.is_marker() {
            return Err(DiagramError::NoStateEndpoint);
        }
        let resolve = |endpoint: Endpoint| {
            self.resolve_endpoint(endpoint).ok_or_else(|| {
                DiagramError::UnknownState(endpoint.state_id().unwrap_or(StateId(0)))
            })
        };
        Ok((resolve(from)?, resolve(to)?))
    }

    /// First state (in insertion order) whose circle contains `point`.
    pub fn find_state(&self, point: Coordinate) -> Option<StateId> {
        self.states
            .iter()
            .find(|state| state.contains(point))
            .map(FiniteState::id)
    }

    /// First transition (in insertion order) drawn within
    /// [`Self::transition_search_radius`] of `point`.
    pub fn find_transition(&self, point: Coordinate) -> Option<TransitionId> {
        self.transitions
            .iter()
            .find(|transition| transition.hit_test(point, self.transition_search_radius))
            .map(Transition::id)
    }

    /// Every transition that touches `state` and satisfies `predicate`.
    pub fn find_transitions<P>(&self, state: StateId, predicate: P) -> Vec<TransitionId>
    where
        P: Fn(&Transition) -> bool,
    {
        self.transitions
            .iter()
            .filter(|transition| transition.touches(state) && predicate(transition))
            .map(Transition::id)
            .collect()
    }

    /// Every transition that touches `state`.
    pub fn transitions_of(&self, state: StateId) -> Vec<TransitionId> {
        self.find_transitions(state, |_| true)
    }

    /// States entered by a transition coming from a marker.
    pub fn initial_states(&self) -> Vec<StateId> {
        let mut initial = Vec::new();
        for transition in &self.transitions {
            if let (Endpoint::Marker(_), Endpoint::State(id)) = (transition.from(), transition.to())
                && !initial.contains(&id)
            {
                initial.push(id);
            }
        }
        initial
    }

    pub fn final_states(&self) -> Vec<StateId> {
        self.states
            .iter()
            .filter(|state| state.is_final())
            .map(FiniteState::id)
            .collect()
    }

    /// Removes a state and every transition that references it.
    ///
    /// Markers belong to their transition, so they disappear with it.
    pub fn remove_state(&mut self, id: StateId) -> Option<FiniteState> {
        let index = self.states.iter().position(|state| state.id() == id)?;
        let removed = self.states.remove(index);
        let before = self.transitions.len();
        self.transitions.retain(|transition| !transition.touches(id));
        debug!(
            "Removed state {} and {} attached transition(s)",
            id,
            before - self.transitions.len()
        );
        Some(removed)
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> Option<Transition> {
        let index = self
            .transitions
            .iter()
            .position(|transition| transition.id() == id)?;
        Some(self.transitions.remove(index))
    }

    /// Moves a state and refreshes every transition attached to it.
    ///
    /// Returns the applied delta, or `None` if the state does not exist.
    pub fn move_state_to(&mut self, id: StateId, coordinate: Coordinate) -> Option<Coordinate> {
        let state = self.state_mut(id)?;
        let delta = coordinate - state.coordinate();
        state.set_coordinate(coordinate);
        self.update_curved_transitions(id);
        Some(delta)
    }

    /// Changes a state's radius and refreshes attached transitions.
    pub fn set_state_radius(&mut self, id: StateId, radius: f64) -> bool {
        let Some(state) = self.state_mut(id) else {
            return false;
        };
        state.set_radius(radius);
        self.update_curved_transitions(id);
        true
    }

    /// Recomputes the cached geometry of every transition touching `state`.
    ///
    /// Curved transitions keep their shape relative to their endpoints;
    /// self-loops rescale with the state radius.
    pub fn update_curved_transitions(&mut self, state: StateId) {
        let Some(circle) = self.state(state).map(FiniteState::circle) else {
            return;
        };
        for transition in self
            .transitions
            .iter_mut()
            .filter(|transition| transition.touches(state))
        {
            let from = resolve_with(transition.from(), state, circle, &self.states);
            let to = resolve_with(transition.to(), state, circle, &self.states);
            if let (Some(from), Some(to)) = (from, to) {
                transition.sync_endpoints(from, to);
            }
        }
    }

    /// Snaps `id` onto the x and/or y of any other state within `padding`.
    ///
    /// The first state (insertion order) within range wins for each axis
    /// independently. Returns `true` if the position changed.
    pub fn snap_state(&mut self, id: StateId, padding: f64) -> bool {
        let Some(current) = self.state(id).map(FiniteState::coordinate) else {
            return false;
        };
        let mut snapped = current;
        if let Some(other) = self
            .states
            .iter()
            .find(|other| other.id() != id && (other.coordinate().x - current.x).abs() < padding)
        {
            snapped.x = other.coordinate().x;
        }
        if let Some(other) = self
            .states
            .iter()
            .find(|other| other.id() != id && (other.coordinate().y - current.y).abs() < padding)
        {
            snapped.y = other.coordinate().y;
        }
        if snapped == current {
            return false;
        }
        self.move_state_to(id, snapped);
        true
    }

    /// Snaps `id` against one specific partner coordinate.
    pub fn snap_state_to(&mut self, id: StateId, partner: Coordinate, padding: f64) -> bool {
        let Some(current) = self.state(id).map(FiniteState::coordinate) else {
            return false;
        };
        let snapped = snap_coordinate(current, partner, padding);
        if snapped == current {
            return false;
        }
        self.move_state_to(id, snapped);
        true
    }

    /// Translates every marker that feeds into `state` by `delta` and snaps
    /// it against the state's new position.
    pub fn translate_incoming_markers(&mut self, state: StateId, delta: Coordinate, padding: f64) {
        let Some(circle) = self.state(state).map(FiniteState::circle) else {
            return;
        };
        for transition in self.transitions.iter_mut() {
            if !transition.to().is_state(state) {
                continue;
            }
            let Some(marker) = transition.marker_mut(Side::From) else {
                continue;
            };
            *marker = snap_coordinate(*marker + delta, circle.center, padding);
            let marker_circle = Circle::new(*marker, 0.0);
            transition.sync_endpoints(marker_circle, circle);
        }
    }

    /// Moves a marker endpoint of a transition to `coordinate`.
    pub fn move_marker(&mut self, id: TransitionId, side: Side, coordinate: Coordinate) -> bool {
        let Some(transition) = self.transition(id) else {
            return false;
        };
        let (from, to) = (transition.from(), transition.to());
        let (from, to) = match side {
            Side::From if from.is_marker() => (Endpoint::Marker(coordinate), to),
            Side::To if to.is_marker() => (from, Endpoint::Marker(coordinate)),
            _ => return false,
        };
        let Ok((from_circle, to_circle)) = self.resolve_pair(from, to) else {
            return false;
        };
        let Some(transition) = self.transition_mut(id) else {
            return false;
        };
        if let Some(marker) = transition.marker_mut(side) {
            *marker = coordinate;
        }
        transition.sync_endpoints(from_circle, to_circle);
        true
    }

    /// Drops every state and transition. Id counters keep running.
    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
    }

    /// Swaps in fully built collections in one step.
    pub(crate) fn replace_contents(
        &mut self,
        states: Vec<FiniteState>,
        transitions: Vec<Transition>,
    ) {
        self.next_state_id = states
            .iter()
            .map(|state| state.id().0 + 1)
            .max()
            .unwrap_or(1)
            .max(self.next_state_id);
        self.next_transition_id = transitions
            .iter()
            .map(|transition| transition.id().0 + 1)
            .max()
            .unwrap_or(1)
            .max(self.next_transition_id);
        self.states = states;
        self.transitions = transitions;
    }
}

fn resolve_with(
    endpoint: Endpoint,
    moved: StateId,
    moved_circle: Circle,
    states: &[FiniteState],
) -> Option<Circle> {
    match endpoint {
        Endpoint::State(id) if id == moved => Some(moved_circle),
        Endpoint::State(id) => states
            .iter()
            .find(|state| state.id() == id)
            .map(FiniteState::circle),
        Endpoint::Marker(coordinate) => Some(Circle::new(coordinate, 0.0)),
    }
}

/// Aligns `coordinate` with `partner` on each axis that is within `padding`.
pub fn snap_coordinate(coordinate: Coordinate, partner: Coordinate, padding: f64) -> Coordinate {
    let mut snapped = coordinate;
    if (partner.x - coordinate.x).abs() < padding {
        snapped.x = partner.x;
    }
    if (partner.y - coordinate.y).abs() < padding {
        snapped.y = partner.y;
    }
    snapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::DEFAULT_MIN_PERPENDICULAR_DISTANCE;

    fn machine_with_states(points: &[(f64, f64)], radius: f64) -> (FiniteStateMachine, Vec<StateId>) {
        let mut machine = FiniteStateMachine::new();
        let ids = points
            .iter()
            .map(|&(x, y)| {
                let id = machine.allocate_state_id();
                machine.add_state(FiniteState::new(id, Coordinate::new(x, y), radius))
            })
            .collect();
        (machine, ids)
    }

    fn connect(machine: &mut FiniteStateMachine, from: Endpoint, to: Endpoint) -> TransitionId {
        let transition = machine
            .build_transition(from, to, DEFAULT_MIN_PERPENDICULAR_DISTANCE)
            .expect("endpoints resolve");
        machine.add_transition(transition).expect("add transition")
    }

    #[test]
    fn find_state_inside_and_outside() {
        let (machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        assert_eq!(machine.find_state(Coordinate::new(55.0, 45.0)), Some(ids[0]));
        assert_eq!(machine.find_state(Coordinate::new(160.0, 60.0)), Some(ids[1]));
        assert_eq!(machine.find_state(Coordinate::new(100.0, 50.0)), None);
        assert_eq!(machine.find_state(Coordinate::new(50.0, 75.0)), None);
    }

    #[test]
    fn find_state_prefers_first_inserted_on_overlap() {
        let (machine, ids) = machine_with_states(&[(50.0, 50.0), (60.0, 50.0)], 20.0);
        assert_eq!(machine.find_state(Coordinate::new(55.0, 50.0)), Some(ids[0]));
    }

    #[test]
    fn find_transition_straight_and_curved() {
        let (mut machine, ids) =
            machine_with_states(&[(50.0, 50.0), (150.0, 50.0), (50.0, 250.0)], 20.0);
        let straight = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        let curved = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[2]));
        machine
            .transition_mut(curved)
            .expect("curved transition")
            .curve_to(Coordinate::new(100.0, 150.0));

        assert_eq!(machine.find_transition(Coordinate::new(100.0, 53.0)), Some(straight));
        assert_eq!(machine.find_transition(Coordinate::new(100.0, 150.0)), Some(curved));
        assert_eq!(machine.find_transition(Coordinate::new(300.0, 300.0)), None);
    }

    #[test]
    fn marker_to_marker_is_rejected() {
        let mut machine = FiniteStateMachine::new();
        let result = machine.build_transition(
            Endpoint::Marker(Coordinate::new(0.0, 0.0)),
            Endpoint::Marker(Coordinate::new(10.0, 0.0)),
            DEFAULT_MIN_PERPENDICULAR_DISTANCE,
        );
        assert_eq!(result.unwrap_err(), DiagramError::NoStateEndpoint);
    }

    #[test]
    fn unknown_state_is_rejected() {
        let mut machine = FiniteStateMachine::new();
        let result = machine.build_transition(
            Endpoint::State(StateId(42)),
            Endpoint::Marker(Coordinate::new(10.0, 0.0)),
            DEFAULT_MIN_PERPENDICULAR_DISTANCE,
        );
        assert_eq!(result.unwrap_err(), DiagramError::UnknownState(StateId(42)));
    }

    #[test]
    fn removing_state_cascades_to_transitions_and_markers() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        connect(&mut machine, Endpoint::State(ids[1]), Endpoint::State(ids[1]));
        connect(
            &mut machine,
            Endpoint::Marker(Coordinate::new(0.0, 50.0)),
            Endpoint::State(ids[0]),
        );
        assert_eq!(machine.initial_states(), vec![ids[0]]);

        machine.remove_state(ids[0]).expect("state removed");
        assert!(machine.transitions_of(ids[0]).is_empty());
        assert_eq!(machine.transitions().len(), 1);
        assert!(machine.initial_states().is_empty());
        assert!(machine.transitions().iter().all(|t| !t.from().is_marker()));
    }

    #[test]
    fn find_transitions_filters_by_predicate() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        let straight = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        let looped = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[0]));

        assert_eq!(machine.transitions_of(ids[0]), vec![straight, looped]);
        assert_eq!(
            machine.find_transitions(ids[0], Transition::is_curved),
            vec![looped]
        );
        assert_eq!(machine.find_transitions(ids[1], Transition::is_curved), vec![]);
    }

    #[test]
    fn snap_state_aligns_on_close_axis_only() {
        let (mut machine, ids) = machine_with_states(&[(100.0, 100.0), (104.0, 250.0)], 20.0);
        machine.move_state_to(ids[0], Coordinate::new(100.0, 300.0));
        assert!(machine.snap_state(ids[0], 6.0));
        let snapped = machine.state(ids[0]).expect("state").coordinate();
        assert_eq!(snapped, Coordinate::new(104.0, 300.0));
    }

    #[test]
    fn snap_state_to_partner() {
        let (mut machine, ids) = machine_with_states(&[(100.0, 100.0)], 20.0);
        assert!(machine.snap_state_to(ids[0], Coordinate::new(97.0, 103.0), 6.0));
        assert_eq!(
            machine.state(ids[0]).expect("state").coordinate(),
            Coordinate::new(97.0, 103.0)
        );
        assert!(!machine.snap_state_to(ids[0], Coordinate::new(0.0, 0.0), 6.0));
    }

    #[test]
    fn update_curved_transitions_is_idempotent() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        let id = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        machine
            .transition_mut(id)
            .expect("transition")
            .curve_to(Coordinate::new(100.0, 80.0));

        machine.update_curved_transitions(ids[0]);
        let first = machine.transition(id).expect("transition").clone();
        machine.update_curved_transitions(ids[0]);
        let second = machine.transition(id).expect("transition");
        assert_eq!(first.center_arc(), second.center_arc());
        assert_eq!(first.radius(), second.radius());
    }

    #[test]
    fn moving_state_preserves_curve_shape() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        let id = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        machine
            .transition_mut(id)
            .expect("transition")
            .curve_to(Coordinate::new(100.0, 80.0));
        let before = machine.transition(id).expect("transition").clone();

        machine.move_state_to(ids[0], Coordinate::new(50.0, 150.0));
        machine.move_state_to(ids[1], Coordinate::new(150.0, 150.0));
        let after = machine.transition(id).expect("transition");

        assert_eq!(before.parallel_axis(), after.parallel_axis());
        assert_eq!(before.perpendicular_axis(), after.perpendicular_axis());
        assert!((after.radius() - before.radius()).abs() < 1e-9);
        let shift = after.center_arc() - before.center_arc();
        assert!((shift - Coordinate::new(0.0, 100.0)).length() < 1e-9);
    }

    #[test]
    fn curve_survives_state_dragged_through_partner() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0), (150.0, 50.0)], 20.0);
        let id = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[1]));
        machine
            .transition_mut(id)
            .expect("transition")
            .curve_to(Coordinate::new(100.0, 80.0));
        let before = machine.transition(id).expect("transition").clone();

        machine.move_state_to(ids[0], Coordinate::new(147.0, 52.0));
        assert!(machine.snap_state(ids[0], 6.0));
        assert_eq!(
            machine.state(ids[0]).expect("state").coordinate(),
            Coordinate::new(150.0, 50.0)
        );
        let overlapping = machine.transition(id).expect("transition");
        assert!(overlapping.is_curved());
        assert!(overlapping.from_angle().is_finite() && overlapping.to_angle().is_finite());

        machine.move_state_to(ids[0], Coordinate::new(50.0, 50.0));
        let after = machine.transition(id).expect("transition");
        assert!(after.is_curved());
        assert_eq!(after.perpendicular_axis(), before.perpendicular_axis());
        assert_eq!(after.is_reversed(), before.is_reversed());
        assert!((after.radius() - before.radius()).abs() < 1e-9);
    }

    #[test]
    fn resizing_state_rescales_self_loop() {
        let (mut machine, ids) = machine_with_states(&[(50.0, 50.0)], 20.0);
        let id = connect(&mut machine, Endpoint::State(ids[0]), Endpoint::State(ids[0]));
        assert!(machine.set_state_radius(ids[0], 40.0));
        assert!((machine.transition(id).expect("loop").radius() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn incoming_markers_follow_their_state() {
        let (mut machine, ids) = machine_with_states(&[(100.0, 100.0)], 20.0);
        let id = connect(
            &mut machine,
            Endpoint::Marker(Coordinate::new(40.0, 97.0)),
            Endpoint::State(ids[0]),
        );
        let delta = machine
            .move_state_to(ids[0], Coordinate::new(130.0, 140.0))
            .expect("moved");
        machine.translate_incoming_markers(ids[0], delta, 6.0);

        // (40,97) + (30,40) = (70,137); y is within 6px of 140 and snaps.
        let transition = machine.transition(id).expect("transition");
        assert_eq!(transition.from(), Endpoint::Marker(Coordinate::new(70.0, 140.0)));
        assert_eq!(transition.from_circle().center, Coordinate::new(70.0, 140.0));
    }

    #[test]
    fn ids_are_never_reused() {
        let (mut machine, ids) = machine_with_states(&[(0.0, 0.0)], 10.0);
        machine.remove_state(ids[0]);
        let next = machine.allocate_state_id();
        assert_ne!(next, ids[0]);
    }
}
