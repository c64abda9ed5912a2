//! Serialized diagram document and id re-linking on load.

use crate::diagram::{
    DEFAULT_MIN_PERPENDICULAR_DISTANCE, DEFAULT_TRANSITION_SEARCH_RADIUS, DiagramInfo, Endpoint,
    FALLBACK_STATE_RADIUS, FiniteState, FiniteStateMachine, StateId, Transition, TransitionId,
};
use crate::geometry::{Circle, Coordinate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::f64::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// One state in the serialized form. Non-drawable records are the free ends
/// of transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default = "default_drawable")]
    pub drawable: bool,
    #[serde(default)]
    pub text: String,
}

/// One transition; endpoints reference [`StateRecord::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub id: u64,
    pub from_state: u64,
    pub to_state: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_parallel_axis")]
    pub parallel_axis: f64,
    #[serde(default)]
    pub perpendicular_axis: f64,
    #[serde(default = "default_min_perpendicular_distance")]
    pub min_perpendicular_distance: f64,
    #[serde(default = "default_self_angle")]
    pub self_angle: f64,
}

/// A whole diagram as stored on disk or exported as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_search_radius")]
    pub transition_search_radius: f64,
    #[serde(default)]
    pub states: Vec<StateRecord>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

fn default_radius() -> f64 {
    FALLBACK_STATE_RADIUS
}

fn default_drawable() -> bool {
    true
}

fn default_parallel_axis() -> f64 {
    0.5
}

fn default_min_perpendicular_distance() -> f64 {
    DEFAULT_MIN_PERPENDICULAR_DISTANCE
}

fn default_self_angle() -> f64 {
    -FRAC_PI_2
}

fn default_width() -> f64 {
    DiagramInfo::default().width
}

fn default_height() -> f64 {
    DiagramInfo::default().height
}

fn default_search_radius() -> f64 {
    DEFAULT_TRANSITION_SEARCH_RADIUS
}

impl DiagramDocument {
    /// Serializes the model. Each marker endpoint becomes its own
    /// non-drawable state with an id above every real state id.
    pub fn from_machine(machine: &FiniteStateMachine) -> Self {
        let mut states: Vec<StateRecord> = machine
            .states()
            .iter()
            .map(|state| StateRecord {
                id: state.id().0,
                x: state.coordinate().x,
                y: state.coordinate().y,
                radius: state.radius(),
                is_final: state.is_final(),
                drawable: true,
                text: state.text.clone(),
            })
            .collect();

        let mut next_marker_id = states.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let mut endpoint_id = |endpoint: Endpoint, states: &mut Vec<StateRecord>| match endpoint {
            Endpoint::State(id) => id.0,
            Endpoint::Marker(coordinate) => {
                let id = next_marker_id;
                next_marker_id += 1;
                states.push(StateRecord {
                    id,
                    x: coordinate.x,
                    y: coordinate.y,
                    radius: 0.0,
                    is_final: false,
                    drawable: false,
                    text: String::new(),
                });
                id
            }
        };

        let transitions = machine
            .transitions()
            .iter()
            .map(|transition| TransitionRecord {
                id: transition.id().0,
                from_state: endpoint_id(transition.from(), &mut states),
                to_state: endpoint_id(transition.to(), &mut states),
                text: transition.text.clone(),
                parallel_axis: transition.parallel_axis(),
                perpendicular_axis: transition.perpendicular_axis(),
                min_perpendicular_distance: transition.min_perpendicular_distance(),
                self_angle: transition.self_angle(),
            })
            .collect();

        Self {
            id: machine.info.id,
            name: machine.info.name.clone(),
            description: machine.info.description.clone(),
            width: machine.info.width,
            height: machine.info.height,
            transition_search_radius: machine.transition_search_radius,
            states,
            transitions,
        }
    }
}

/// Errors that abort a load. The model is untouched when one is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load cancelled")]
    Cancelled,

    #[error("failed to parse diagram document: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a load kept and what it had to discard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub states: usize,
    pub transitions: usize,
    /// Transitions referencing a state id that is not in the document, or
    /// joining two free ends
    pub dropped_transitions: usize,
    /// Records whose id was already seen
    pub duplicate_records: usize,
    /// Non-drawable states no transition references
    pub pruned_markers: usize,
}

/// Replaces the contents of `machine` with `document`.
///
/// Everything is built into staging collections first; the model is only
/// touched once the whole document has been processed. Setting `cancel`
/// makes the load stop with [`LoadError::Cancelled`] and leaves the model
/// as it was.
pub fn load_document(
    machine: &mut FiniteStateMachine,
    document: &DiagramDocument,
    cancel: &AtomicBool,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();
    let mut seen_states = HashSet::new();
    let mut states = Vec::new();
    let mut circles: HashMap<u64, Circle> = HashMap::new();
    let mut markers: HashMap<u64, Coordinate> = HashMap::new();

    for record in &document.states {
        check_cancelled(cancel)?;
        if !seen_states.insert(record.id) {
            warn!("Skipping duplicate state record {}", record.id);
            report.duplicate_records += 1;
            continue;
        }
        let coordinate = Coordinate::new(record.x, record.y);
        if !record.drawable {
            markers.insert(record.id, coordinate);
            continue;
        }
        let mut state = FiniteState::new(StateId(record.id), coordinate, record.radius);
        state.set_final(record.is_final);
        state.text = record.text.clone();
        circles.insert(record.id, state.circle());
        states.push(state);
    }

    let resolve = |id: u64| -> Option<(Endpoint, Circle)> {
        if let Some(circle) = circles.get(&id) {
            return Some((Endpoint::State(StateId(id)), *circle));
        }
        markers
            .get(&id)
            .map(|coordinate| (Endpoint::Marker(*coordinate), Circle::new(*coordinate, 0.0)))
    };

    let mut seen_transitions = HashSet::new();
    let mut used_markers = HashSet::new();
    let mut transitions = Vec::new();

    for record in &document.transitions {
        check_cancelled(cancel)?;
        if !seen_transitions.insert(record.id) {
            warn!("Skipping duplicate transition record {}", record.id);
            report.duplicate_records += 1;
            continue;
        }
        let (Some((from, from_circle)), Some((to, to_circle))) =
            (resolve(record.from_state), resolve(record.to_state))
        else {
            warn!(
                "Dropping transition {}: state {} or {} does not exist",
                record.id, record.from_state, record.to_state
            );
            report.dropped_transitions += 1;
            continue;
        };
        if from.is_marker() && to.is_marker() {
            warn!("Dropping transition {}: neither end is a state", record.id);
            report.dropped_transitions += 1;
            continue;
        }
        for (endpoint, id) in [(from, record.from_state), (to, record.to_state)] {
            if endpoint.is_marker() {
                used_markers.insert(id);
            }
        }

        let mut transition = Transition::new(
            TransitionId(record.id),
            from,
            to,
            from_circle,
            to_circle,
            record.min_perpendicular_distance,
        );
        transition.restore_curve(
            record.parallel_axis,
            record.perpendicular_axis,
            record.self_angle,
        );
        transition.text = record.text.clone();
        transitions.push(transition);
    }

    check_cancelled(cancel)?;

    report.pruned_markers = markers.len() - used_markers.len();
    report.states = states.len();
    report.transitions = transitions.len();
    if report.pruned_markers > 0 {
        debug!("Pruned {} unreferenced free ends", report.pruned_markers);
    }

    machine.replace_contents(states, transitions);
    machine.info = DiagramInfo {
        id: document.id,
        name: document.name.clone(),
        description: document.description.clone(),
        width: document.width,
        height: document.height,
    };
    machine.transition_search_radius =
        if document.transition_search_radius.is_finite() && document.transition_search_radius > 0.0 {
            document.transition_search_radius
        } else {
            DEFAULT_TRANSITION_SEARCH_RADIUS
        };

    Ok(report)
}

fn check_cancelled(cancel: &AtomicBool) -> Result<(), LoadError> {
    if cancel.load(Ordering::Relaxed) {
        Err(LoadError::Cancelled)
    } else {
        Ok(())
    }
}
