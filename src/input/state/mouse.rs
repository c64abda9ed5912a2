use crate::diagram::{Endpoint, FiniteState, StateId, Transition};
use crate::draw::Renderer;
use crate::geometry::Coordinate;
use crate::input::{events::MouseButton, tool::Tool};
use log::{debug, warn};

use super::{Drag, Drawer, DrawingState};

/// Drags shorter than this read as a click when connecting inside one state.
const MIN_SELF_LOOP_DRAG: f64 = 1.0;

impl<R: Renderer> Drawer<R> {
    /// Processes a mouse button press event.
    ///
    /// # Arguments
    /// * `button` - Which mouse button was pressed
    /// * `x` - Mouse X coordinate
    /// * `y` - Mouse Y coordinate
    ///
    /// # Behavior
    /// - Left press with Shift: starts a connect gesture from the state under
    ///   the cursor, or from a marker on empty canvas
    /// - Left press near the selected state's rim: starts a resize
    /// - Left press on a state, then a transition, then empty canvas: starts
    ///   the matching drag
    /// - Right press: cancels the current gesture
    pub fn on_mouse_press(&mut self, button: MouseButton, x: f64, y: f64) {
        let point = Coordinate::new(x, y);
        match button {
            MouseButton::Left => {
                if matches!(self.state, DrawingState::Dragging(_)) {
                    return;
                }
                let drag = match self.modifiers.current_tool() {
                    Tool::Connect => Drag::Connect {
                        from: self.endpoint_at(point),
                        start: point,
                        current: point,
                    },
                    Tool::Select => self.select_drag(point),
                };
                self.set_state(DrawingState::Dragging(drag));
            }
            MouseButton::Right => self.cancel_drag(),
            MouseButton::Middle => {}
        }
    }

    /// Processes mouse motion (dragging) events.
    ///
    /// Applies the current gesture to the model immediately so the next
    /// frame shows it.
    pub fn on_mouse_motion(&mut self, x: f64, y: f64) {
        let point = Coordinate::new(x, y);
        let DrawingState::Dragging(drag) = &mut self.state else {
            return;
        };
        match drag {
            Drag::Canvas { start, moved } => *moved |= *start != point,
            Drag::MoveState { moved, .. } | Drag::ResizeState { moved, .. } => *moved = true,
            Drag::Connect { current, .. } => *current = point,
            Drag::CurveTransition { .. } | Drag::SelfLoopAngle { .. } => {}
        }
        let drag = drag.clone();

        match drag {
            Drag::MoveState { id, offset, .. } => self.drag_state_to(id, point + offset),
            Drag::ResizeState { id, .. } => {
                let Some(center) = self.machine.state(id).map(FiniteState::coordinate) else {
                    return;
                };
                self.machine.set_state_radius(id, center.distance(point));
                self.mark_dirty();
            }
            Drag::CurveTransition { id } => {
                if let Some(transition) = self.machine.transition_mut(id) {
                    transition.curve_to(point);
                    self.mark_dirty();
                }
            }
            Drag::SelfLoopAngle { id } => {
                if let Some(transition) = self.machine.transition_mut(id) {
                    transition.update_self_transition(point);
                    self.mark_dirty();
                }
            }
            Drag::Connect { .. } => self.needs_redraw = true,
            Drag::Canvas { .. } => {}
        }
    }

    /// Processes mouse button release events.
    ///
    /// # Behavior
    /// - Click on empty canvas: creates a state there and selects it
    /// - Click on the already selected state: toggles it final
    /// - End of a connect gesture: creates the transition and selects it
    /// - End of any other drag: selects the dragged element
    pub fn on_mouse_release(&mut self, button: MouseButton, x: f64, y: f64) {
        if button != MouseButton::Left {
            return;
        }
        let DrawingState::Dragging(drag) = &self.state else {
            return;
        };
        let point = Coordinate::new(x, y);

        let next = match drag.clone() {
            Drag::Canvas { moved: false, .. } => self.create_state(point),
            Drag::Canvas { moved: true, .. } => DrawingState::Idle,
            Drag::MoveState {
                id,
                moved,
                was_selected,
                ..
            } => {
                if !moved && was_selected {
                    self.toggle_final(id);
                }
                DrawingState::StateSelected(id)
            }
            Drag::ResizeState { id, moved } => {
                let inside = self.machine.state(id).is_some_and(|s| s.contains(point));
                if !moved && inside {
                    self.toggle_final(id);
                }
                DrawingState::StateSelected(id)
            }
            Drag::CurveTransition { id } | Drag::SelfLoopAngle { id } => {
                DrawingState::TransitionSelected(id)
            }
            Drag::Connect { from, start, .. } => self.create_transition(from, start, point),
        };
        self.set_state(next);
    }

    /// Ends the current gesture. Edits already applied stay; a pending
    /// connect or canvas click is dropped.
    pub(super) fn cancel_drag(&mut self) {
        let DrawingState::Dragging(drag) = &self.state else {
            return;
        };
        let next = match drag {
            Drag::MoveState { id, .. } | Drag::ResizeState { id, .. } => {
                DrawingState::StateSelected(*id)
            }
            Drag::CurveTransition { id } | Drag::SelfLoopAngle { id } => {
                DrawingState::TransitionSelected(*id)
            }
            Drag::Canvas { .. } | Drag::Connect { .. } => DrawingState::Idle,
        };
        self.set_state(next);
    }

    /// State under `point`, or a marker on empty canvas.
    pub(super) fn endpoint_at(&self, point: Coordinate) -> Endpoint {
        self.machine
            .find_state(point)
            .map(Endpoint::State)
            .unwrap_or(Endpoint::Marker(point.clamped()))
    }

    fn select_drag(&mut self, point: Coordinate) -> Drag {
        let selected = self.selected_state();
        if let Some(state) = selected.and_then(|id| self.machine.state(id)) {
            let rim_distance = (state.coordinate().distance(point) - state.radius()).abs();
            if rim_distance <= self.settings.resize_tolerance {
                return Drag::ResizeState {
                    id: state.id(),
                    moved: false,
                };
            }
        }

        if let Some(state) = self.machine.find_state(point).and_then(|id| self.machine.state(id)) {
            return Drag::MoveState {
                id: state.id(),
                offset: state.coordinate() - point,
                moved: false,
                was_selected: selected == Some(state.id()),
            };
        }

        if let Some(id) = self.machine.find_transition(point)
            && let Some(transition) = self.machine.transition_mut(id)
        {
            if transition.is_self_loop() {
                transition.begin_self_loop_drag(point);
                return Drag::SelfLoopAngle { id };
            }
            return Drag::CurveTransition { id };
        }

        Drag::Canvas {
            start: point,
            moved: false,
        }
    }

    /// Moves a state under the cursor, snapping it to neighbours and carrying
    /// the free ends of incoming marker transitions along.
    fn drag_state_to(&mut self, id: StateId, target: Coordinate) {
        let Some(before) = self.machine.state(id).map(FiniteState::coordinate) else {
            return;
        };
        let padding = self.settings.effective_snap_padding();
        self.machine.move_state_to(id, target.clamped());
        if self.settings.snap_enabled {
            self.machine.snap_state(id, padding);
        }
        let Some(after) = self.machine.state(id).map(FiniteState::coordinate) else {
            return;
        };
        self.machine.translate_incoming_markers(id, after - before, padding);
        self.mark_dirty();
    }

    fn toggle_final(&mut self, id: StateId) {
        if let Some(state) = self.machine.state_mut(id) {
            let is_final = state.toggle_final();
            debug!("State {id} final: {is_final}");
            self.mark_dirty();
        }
    }

    fn create_state(&mut self, point: Coordinate) -> DrawingState {
        let id = self.machine.allocate_state_id();
        let state = FiniteState::new(id, point.clamped(), self.settings.default_state_radius);
        if !self
            .renderer
            .draw_state(&state, self.settings.palette.selected, false)
        {
            warn!(
                "Renderer rejected new state at ({:.0}, {:.0}); discarding it",
                point.x, point.y
            );
            return DrawingState::Idle;
        }
        self.machine.add_state(state);
        self.mark_dirty();
        debug!("Created state {id} at ({:.0}, {:.0})", point.x, point.y);
        DrawingState::StateSelected(id)
    }

    fn create_transition(
        &mut self,
        from: Endpoint,
        start: Coordinate,
        point: Coordinate,
    ) -> DrawingState {
        let to = self.endpoint_at(point);
        if from.is_marker() && to.is_marker() {
            warn!("A transition needs at least one state endpoint; ignoring drag");
            return DrawingState::Idle;
        }

        let mut transition = match self.machine.build_transition(
            from,
            to,
            self.settings.min_perpendicular_distance,
        ) {
            Ok(transition) => transition,
            Err(err) => {
                warn!("Cannot connect {from:?} to {to:?}: {err}");
                return DrawingState::Idle;
            }
        };
        if transition.is_self_loop() {
            transition.set_self_angle(self_loop_angle(&transition, start, point));
        }

        if !self
            .renderer
            .draw_transition(&transition, self.settings.palette.selected, false)
        {
            warn!("Renderer rejected new transition {}; discarding it", transition.id());
            return DrawingState::Idle;
        }

        match self.machine.add_transition(transition) {
            Ok(id) => {
                self.mark_dirty();
                debug!("Created transition {id}");
                DrawingState::TransitionSelected(id)
            }
            Err(err) => {
                warn!("Failed to add transition: {err}");
                DrawingState::Idle
            }
        }
    }
}

/// Direction a new self-loop points: along the drag, or from the state
/// center towards the cursor when the drag was too short to tell.
fn self_loop_angle(transition: &Transition, start: Coordinate, end: Coordinate) -> f64 {
    let drag = end - start;
    if drag.length() >= MIN_SELF_LOOP_DRAG {
        return drag.angle();
    }
    let outward = end - transition.from_circle().center;
    if outward.length() > 0.0 {
        outward.angle()
    } else {
        transition.self_angle()
    }
}
