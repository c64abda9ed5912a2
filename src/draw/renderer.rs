//! The drawing contract every output backend implements.

use super::color::{self, Color};
use crate::diagram::{FiniteState, FiniteStateMachine, StateId, Transition, TransitionId};

/// Drawing surface the interaction layer issues its frames to.
///
/// Each call reports whether it succeeded. A failed `draw_state` or
/// `draw_transition` while creating an element means the element is not
/// added to the diagram.
pub trait Renderer {
    /// Clears the surface. Returns `false` if the surface is unavailable.
    fn clear(&mut self) -> bool;

    /// Fills the surface with `color`.
    fn draw_background(&mut self, color: Color);

    fn draw_state(&mut self, state: &FiniteState, color: Color, show_caret: bool) -> bool;

    fn draw_transition(&mut self, transition: &Transition, color: Color, show_caret: bool)
    -> bool;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn clear(&mut self) -> bool {
        (**self).clear()
    }

    fn draw_background(&mut self, color: Color) {
        (**self).draw_background(color)
    }

    fn draw_state(&mut self, state: &FiniteState, color: Color, show_caret: bool) -> bool {
        (**self).draw_state(state, color, show_caret)
    }

    fn draw_transition(
        &mut self,
        transition: &Transition,
        color: Color,
        show_caret: bool,
    ) -> bool {
        (**self).draw_transition(transition, color, show_caret)
    }
}

/// Colors used for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub stroke: Color,
    pub selected: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: color::WHITE,
            stroke: color::BLACK,
            selected: color::BLUE,
        }
    }
}

/// Which element (if any) is drawn highlighted, and whether its caret shows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Highlight {
    pub state: Option<StateId>,
    pub transition: Option<TransitionId>,
    pub show_caret: bool,
}

/// Draws the whole diagram in one ordered pass.
///
/// Order: clear, background, states (insertion order), transitions
/// (insertion order). Every call is issued even after a failure; the return
/// value is `true` only if all of them succeeded.
pub fn render_diagram<R: Renderer + ?Sized>(
    renderer: &mut R,
    machine: &FiniteStateMachine,
    palette: &Palette,
    highlight: Highlight,
) -> bool {
    let mut ok = renderer.clear();
    renderer.draw_background(palette.background);

    for state in machine.states() {
        let selected = highlight.state == Some(state.id());
        let color = if selected {
            palette.selected
        } else {
            palette.stroke
        };
        ok &= renderer.draw_state(state, color, selected && highlight.show_caret);
    }

    for transition in machine.transitions() {
        let selected = highlight.transition == Some(transition.id());
        let color = if selected {
            palette.selected
        } else {
            palette.stroke
        };
        ok &= renderer.draw_transition(transition, color, selected && highlight.show_caret);
    }

    ok
}
