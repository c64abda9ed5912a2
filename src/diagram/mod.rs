//! Diagram model: states, transitions and the machine that owns them.
//!
//! States live in one ordered store inside [`FiniteStateMachine`];
//! transitions refer to them by [`StateId`] through an [`Endpoint`], never by
//! embedded copies.

pub mod machine;
pub mod state;
pub mod transition;

pub use machine::{
    DEFAULT_TRANSITION_SEARCH_RADIUS, DiagramError, DiagramInfo, FiniteStateMachine, snap_coordinate,
};
pub use state::{FALLBACK_STATE_RADIUS, FiniteState, StateId};
pub use transition::{
    DEFAULT_MIN_PERPENDICULAR_DISTANCE, Endpoint, LabelAnchor, Side, Transition, TransitionId,
};
