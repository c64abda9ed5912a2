use super::*;
use crate::config::{SessionConfig, SessionStorageMode};
use crate::diagram::{
    Endpoint, FALLBACK_STATE_RADIUS, FiniteState, FiniteStateMachine, StateId, TransitionId,
};
use crate::geometry::Coordinate;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

fn add_state(machine: &mut FiniteStateMachine, x: f64, y: f64, radius: f64) -> StateId {
    let id = machine.allocate_state_id();
    machine.add_state(FiniteState::new(id, Coordinate::new(x, y), radius))
}

fn connect(machine: &mut FiniteStateMachine, from: Endpoint, to: Endpoint) -> TransitionId {
    let transition = machine.build_transition(from, to, 0.02).unwrap();
    machine.add_transition(transition).unwrap()
}

/// Two states, a curved edge between them and a free-ended edge out of B.
fn sample_machine() -> FiniteStateMachine {
    let mut machine = FiniteStateMachine::new();
    machine.info.name = "Parity".to_string();
    let a = add_state(&mut machine, 50.0, 50.0, 20.0);
    let b = add_state(&mut machine, 150.0, 50.0, 20.0);
    machine.state_mut(b).unwrap().set_final(true);
    machine.state_mut(a).unwrap().text = "q₀".to_string();

    let curved = connect(&mut machine, Endpoint::State(a), Endpoint::State(b));
    let edge = machine.transition_mut(curved).unwrap();
    edge.curve_to(Coordinate::new(100.0, 80.0));
    edge.text = "1".to_string();

    connect(
        &mut machine,
        Endpoint::State(b),
        Endpoint::Marker(Coordinate::new(300.0, 50.0)),
    );
    machine
}

fn state_record(id: u64, drawable: bool) -> StateRecord {
    StateRecord {
        id,
        x: 10.0 * id as f64,
        y: 40.0,
        radius: if drawable { 15.0 } else { 0.0 },
        is_final: false,
        drawable,
        text: String::new(),
    }
}

fn transition_record(id: u64, from_state: u64, to_state: u64) -> TransitionRecord {
    TransitionRecord {
        id,
        from_state,
        to_state,
        text: String::new(),
        parallel_axis: 0.5,
        perpendicular_axis: 0.0,
        min_perpendicular_distance: 0.02,
        self_angle: -std::f64::consts::FRAC_PI_2,
    }
}

#[test]
fn options_from_config_custom_storage() {
    let temp = tempfile::tempdir().unwrap();
    let custom_dir = temp.path().join("diagrams");

    let cfg = SessionConfig {
        storage: SessionStorageMode::Custom,
        custom_directory: Some(custom_dir.to_string_lossy().to_string()),
        ..SessionConfig::default()
    };

    let options = options_from_config(&cfg, temp.path(), 7).unwrap();
    assert_eq!(options.base_dir, custom_dir);
    assert_eq!(
        options
            .session_file_path()
            .file_name()
            .unwrap()
            .to_string_lossy(),
        "diagram-7.json"
    );
}

#[test]
fn options_from_config_config_storage_uses_config_dir() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        storage: SessionStorageMode::Config,
        backup_retention: 0,
        ..SessionConfig::default()
    };

    let options = options_from_config(&cfg, temp.path(), 0).unwrap();
    assert_eq!(options.base_dir, temp.path());
    assert_eq!(options.backup_retention, 0);
    assert_eq!(
        options.lock_file_path().file_name().unwrap().to_string_lossy(),
        "diagram-0.lock"
    );
}

#[test]
fn markers_are_written_as_hidden_states_with_fresh_ids() {
    let document = DiagramDocument::from_machine(&sample_machine());

    assert_eq!(document.name, "Parity");
    assert_eq!(document.states.len(), 3);
    let marker = document.states.iter().find(|s| !s.drawable).unwrap();
    assert_eq!(marker.id, 3);
    assert_eq!((marker.x, marker.y), (300.0, 50.0));
    assert_eq!(document.transitions[1].to_state, 3);
}

#[test]
fn document_uses_camel_case_field_names() {
    let json = serde_json::to_string(&DiagramDocument::from_machine(&sample_machine())).unwrap();
    assert!(json.contains("\"transitionSearchRadius\""));
    assert!(json.contains("\"fromState\""));
    assert!(json.contains("\"isFinal\""));
}

#[test]
fn state_without_radius_gets_fallback_size() {
    let document: DiagramDocument = serde_json::from_value(serde_json::json!({
        "states": [{"id": 4, "x": 30.0, "y": 40.0}]
    }))
    .unwrap();
    assert_eq!(document.states[0].radius, FALLBACK_STATE_RADIUS);

    let mut machine = FiniteStateMachine::new();
    load_document(&mut machine, &document, &AtomicBool::new(false)).unwrap();
    let state = machine.state(StateId(4)).unwrap();
    assert_eq!(state.radius(), FALLBACK_STATE_RADIUS);
    assert_eq!(machine.find_state(Coordinate::new(36.0, 40.0)), Some(StateId(4)));
}

#[test]
fn save_and_load_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let original = sample_machine();
    let mut store = SessionStore::new(SessionOptions::new(temp.path().to_path_buf(), "1"));

    store.save(&DiagramDocument::from_machine(&original)).unwrap();
    let document = store.load().unwrap().expect("document saved");

    let mut restored = FiniteStateMachine::new();
    let report = load_document(&mut restored, &document, &AtomicBool::new(false)).unwrap();

    assert_eq!(report.states, 2);
    assert_eq!(report.transitions, 2);
    assert_eq!(report.dropped_transitions, 0);
    assert_eq!(restored.states(), original.states());
    assert_eq!(restored.info.name, "Parity");

    for (before, after) in original.transitions().iter().zip(restored.transitions()) {
        assert_eq!(before.id(), after.id());
        assert_eq!(before.from(), after.from());
        assert_eq!(before.to(), after.to());
        assert_eq!(before.text, after.text);
        assert_eq!(before.is_curved(), after.is_curved());
        assert!((before.radius() - after.radius()).abs() < 1e-9);
        assert!((before.center_arc() - after.center_arc()).length() < 1e-9);
    }
}

#[test]
fn second_save_rotates_backup() {
    let temp = tempfile::tempdir().unwrap();
    let options = SessionOptions::new(temp.path().to_path_buf(), "2");
    let document = DiagramDocument::from_machine(&sample_machine());

    save_document(&document, &options).unwrap();
    assert!(!options.backup_file_path().exists());
    save_document(&document, &options).unwrap();
    assert!(options.session_file_path().exists());
    assert!(options.backup_file_path().exists());
}

#[test]
fn compressed_session_is_gzip_and_loads() {
    let temp = tempfile::tempdir().unwrap();
    let mut options = SessionOptions::new(temp.path().to_path_buf(), "gz");
    options.compression = CompressionMode::On;

    save_document(&DiagramDocument::from_machine(&sample_machine()), &options).unwrap();
    let bytes = std::fs::read(options.session_file_path()).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let loaded = load_session(&options).unwrap().unwrap();
    assert!(loaded.compressed);
    assert!(loaded.last_modified.is_some());
    assert_eq!(loaded.document.transitions.len(), 2);
}

#[test]
fn oversized_payload_is_not_written() {
    let temp = tempfile::tempdir().unwrap();
    let mut options = SessionOptions::new(temp.path().to_path_buf(), "big");
    options.max_file_size_bytes = 16;

    let err = save_document(&DiagramDocument::from_machine(&sample_machine()), &options)
        .unwrap_err();
    assert!(err.to_string().contains("exceeds the configured limit"));
    assert!(!options.session_file_path().exists());
    assert!(load_session(&options).unwrap().is_none());
}

#[test]
fn bare_exported_document_can_be_read() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("export.json");
    let document = DiagramDocument::from_machine(&sample_machine());
    std::fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();

    let loaded = read_document_file(&path, 1024 * 1024).unwrap();
    assert!(!loaded.compressed);
    assert!(loaded.last_modified.is_none());
    assert_eq!(loaded.document, document);
}

#[test]
fn read_rejects_files_over_limit() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("export.json");
    std::fs::write(&path, "{}").unwrap();
    assert!(read_document_file(&path, 1).is_err());
}

#[test]
fn load_drops_dangling_and_prunes_unused_markers() {
    let document = DiagramDocument {
        id: 4,
        name: "partial".to_string(),
        description: String::new(),
        width: 640.0,
        height: 480.0,
        transition_search_radius: 8.0,
        states: vec![
            state_record(1, true),
            state_record(2, true),
            state_record(1, true),
            state_record(10, false),
            state_record(11, false),
        ],
        transitions: vec![
            transition_record(1, 1, 2),
            transition_record(2, 2, 99),
            transition_record(3, 10, 1),
            transition_record(3, 1, 1),
        ],
    };

    let mut machine = FiniteStateMachine::new();
    let report = load_document(&mut machine, &document, &AtomicBool::new(false)).unwrap();

    assert_eq!(
        report,
        LoadReport {
            states: 2,
            transitions: 2,
            dropped_transitions: 1,
            duplicate_records: 2,
            pruned_markers: 1,
        }
    );
    assert_eq!(
        machine.transition(TransitionId(3)).unwrap().from(),
        Endpoint::Marker(Coordinate::new(100.0, 40.0))
    );
    assert_eq!(machine.transition_search_radius, 8.0);
    assert_eq!(machine.info.width, 640.0);
    assert_eq!(machine.allocate_state_id(), StateId(3));
    assert_eq!(machine.allocate_transition_id(), TransitionId(4));
}

#[test]
fn cancelled_load_leaves_model_untouched() {
    let mut machine = sample_machine();
    let before_states = machine.states().to_vec();
    let before_transitions = machine.transitions().to_vec();

    let document = DiagramDocument {
        states: vec![state_record(1, true)],
        ..DiagramDocument::from_machine(&FiniteStateMachine::new())
    };
    let result = load_document(&mut machine, &document, &AtomicBool::new(true));

    assert!(matches!(result, Err(LoadError::Cancelled)));
    assert_eq!(machine.states(), &before_states[..]);
    assert_eq!(machine.transitions(), &before_transitions[..]);
    assert_eq!(machine.info.name, "Parity");
}

#[test]
fn sanitized_identifier_in_file_name() {
    let options = SessionOptions::new(PathBuf::from("/tmp"), "my diagram/1");
    assert_eq!(
        options.session_file_path(),
        PathBuf::from("/tmp/diagram-my_diagram_1.json")
    );
}
