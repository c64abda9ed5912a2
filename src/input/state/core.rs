//! Interaction state machine and the [`Drawer`] controller.

use crate::config::{Action, Config, KeyBinding};
use crate::diagram::{
    DEFAULT_MIN_PERPENDICULAR_DISTANCE, Endpoint, FiniteStateMachine, StateId, TransitionId,
};
use crate::draw::{Palette, Renderer};
use crate::geometry::Coordinate;
use crate::input::{modifiers::Modifiers, text::ScriptMode};
use crate::session::{DiagramDocument, DiagramStore};
use crate::ticker::FrameScheduler;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Pointer gesture in progress while the primary button is held.
#[derive(Debug, Clone, PartialEq)]
pub enum Drag {
    /// Pressed on empty canvas. Releasing without moving creates a state.
    Canvas { start: Coordinate, moved: bool },
    /// Dragging a state body. `offset` keeps the grab point under the cursor.
    MoveState {
        id: StateId,
        offset: Coordinate,
        moved: bool,
        /// The state was already selected when pressed; a plain click toggles
        /// it final.
        was_selected: bool,
    },
    /// Dragging the rim of the selected state.
    ResizeState { id: StateId, moved: bool },
    /// Bending a transition between two distinct endpoints.
    CurveTransition { id: TransitionId },
    /// Rotating a self-loop around its state.
    SelfLoopAngle { id: TransitionId },
    /// Shift-drag drawing a new transition.
    Connect {
        from: Endpoint,
        start: Coordinate,
        current: Coordinate,
    },
}

/// Current interaction mode.
///
/// Selection and drag are mutually exclusive: a drag always ends in one of
/// the other variants.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingState {
    Idle,
    StateSelected(StateId),
    TransitionSelected(TransitionId),
    Dragging(Drag),
}

/// Tunables the controller reads on every gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawerSettings {
    /// Radius of states created by clicking the canvas
    pub default_state_radius: f64,
    pub snap_enabled: bool,
    /// Axis distance under which a dragged state aligns with a neighbour
    pub snap_padding: f64,
    /// Distance from the selected state's rim that starts a resize
    pub resize_tolerance: f64,
    pub min_perpendicular_distance: f64,
    pub palette: Palette,
    /// Caret blink, redraw and autosave period
    pub tick_interval: Duration,
    pub autosave: bool,
}

impl Default for DrawerSettings {
    fn default() -> Self {
        Self {
            default_state_radius: 30.0,
            snap_enabled: true,
            snap_padding: 6.0,
            resize_tolerance: 10.0,
            min_perpendicular_distance: DEFAULT_MIN_PERPENDICULAR_DISTANCE,
            palette: Palette::default(),
            tick_interval: Duration::from_millis(500),
            autosave: true,
        }
    }
}

impl DrawerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_state_radius: config.drawing.default_state_radius,
            snap_enabled: config.interaction.snap_enabled,
            snap_padding: config.interaction.snap_padding,
            resize_tolerance: config.interaction.resize_tolerance,
            min_perpendicular_distance: config.interaction.min_perpendicular_distance,
            palette: config.palette(),
            tick_interval: Duration::from_millis(config.ticker.interval_ms),
            autosave: config.ticker.autosave,
        }
    }

    /// Padding actually applied when snapping; zero when snapping is off.
    pub(crate) fn effective_snap_padding(&self) -> f64 {
        if self.snap_enabled {
            self.snap_padding
        } else {
            0.0
        }
    }
}

/// Owns one diagram and turns pointer/keyboard events into edits.
///
/// Every new element is drawn through the renderer before it is committed to
/// the model; a rejected draw leaves the model untouched.
pub struct Drawer<R: Renderer> {
    /// The diagram being edited
    pub machine: FiniteStateMachine,
    /// Current interaction mode
    pub state: DrawingState,
    /// Current modifier key state
    pub modifiers: Modifiers,
    /// Whether the display needs to be redrawn
    pub needs_redraw: bool,
    pub(super) renderer: R,
    pub(super) settings: DrawerSettings,
    pub(super) action_map: HashMap<KeyBinding, Action>,
    pub(super) pending_action: Option<Action>,
    pub(super) script_mode: ScriptMode,
    pub(super) caret_visible: bool,
    pub(super) unsaved: bool,
    pub(super) scheduler: FrameScheduler,
    pub(super) store: Option<Box<dyn DiagramStore + Send>>,
}

impl<R: Renderer> Drawer<R> {
    /// Creates a controller over an empty diagram.
    pub fn with_defaults(
        renderer: R,
        settings: DrawerSettings,
        action_map: HashMap<KeyBinding, Action>,
    ) -> Self {
        let scheduler = FrameScheduler::new(settings.tick_interval, Instant::now());
        Self {
            machine: FiniteStateMachine::new(),
            state: DrawingState::Idle,
            modifiers: Modifiers::new(),
            needs_redraw: true,
            renderer,
            settings,
            action_map,
            pending_action: None,
            script_mode: ScriptMode::Normal,
            caret_visible: false,
            unsaved: false,
            scheduler,
            store: None,
        }
    }

    /// Creates a controller configured from user settings.
    ///
    /// # Errors
    /// Returns an error if a keybinding cannot be parsed or is bound twice.
    pub fn from_config(renderer: R, config: &Config) -> Result<Self, String> {
        let action_map = config.keybindings.build_action_map()?;
        let mut drawer = Self::with_defaults(renderer, DrawerSettings::from_config(config), action_map);
        drawer.machine.transition_search_radius = config.interaction.transition_search_radius;
        Ok(drawer)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn settings(&self) -> &DrawerSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn script_mode(&self) -> ScriptMode {
        self.script_mode
    }

    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Whether the diagram changed since it was last saved.
    pub fn is_dirty(&self) -> bool {
        self.unsaved
    }

    pub fn selected_state(&self) -> Option<StateId> {
        match &self.state {
            DrawingState::StateSelected(id) => Some(*id),
            DrawingState::Dragging(Drag::MoveState { id, .. } | Drag::ResizeState { id, .. }) => {
                Some(*id)
            }
            _ => None,
        }
    }

    pub fn selected_transition(&self) -> Option<TransitionId> {
        match &self.state {
            DrawingState::TransitionSelected(id) => Some(*id),
            DrawingState::Dragging(
                Drag::CurveTransition { id } | Drag::SelfLoopAngle { id },
            ) => Some(*id),
            _ => None,
        }
    }

    /// Attaches the store used by autosave.
    pub fn set_store(&mut self, store: Box<dyn DiagramStore + Send>) {
        self.store = Some(store);
    }

    /// Replaces the diagram wholesale (after loading) and drops the selection.
    pub fn replace_machine(&mut self, machine: FiniteStateMachine) {
        self.machine = machine;
        self.set_state(DrawingState::Idle);
        self.unsaved = false;
    }

    /// Saves immediately through the attached store.
    ///
    /// Returns `Ok(false)` if no store is attached.
    pub fn save_now(&mut self) -> anyhow::Result<bool> {
        let Some(store) = self.store.as_mut() else {
            return Ok(false);
        };
        store.save(&DiagramDocument::from_machine(&self.machine))?;
        self.unsaved = false;
        Ok(true)
    }

    /// Takes the export action requested by the last key press, if any.
    pub fn take_pending_action(&mut self) -> Option<Action> {
        self.pending_action.take()
    }

    pub(super) fn set_pending_action(&mut self, action: Action) {
        self.pending_action = Some(action);
    }

    pub(super) fn mark_dirty(&mut self) {
        self.unsaved = true;
        self.needs_redraw = true;
    }

    /// Switches mode. Leaving a selection resets the script mode so the next
    /// label starts with plain digits.
    pub(super) fn set_state(&mut self, state: DrawingState) {
        let previous = (self.selected_state(), self.selected_transition());
        self.state = state;
        if previous != (self.selected_state(), self.selected_transition()) {
            self.script_mode = ScriptMode::Normal;
        }
        self.needs_redraw = true;
    }

    /// Looks up the action bound to `key_str` under the current modifiers.
    pub(super) fn find_action(&self, key_str: &str) -> Option<Action> {
        self.action_map
            .iter()
            .find(|(binding, _)| {
                binding.matches(
                    key_str,
                    self.modifiers.ctrl,
                    self.modifiers.shift,
                    self.modifiers.alt,
                )
            })
            .map(|(_, action)| *action)
    }
}
