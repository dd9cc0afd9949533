//! ML states backed by the `Classifier` fixture

use pyhost::{Map, Value};
use pyhost_state::{
    CreatorRegistry, MlCreator, MlParams, MlState, SharedState, SharedStates, StateError,
    ML_STATE,
};
use std::io::Cursor;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../pyhost/tests/python");
const MODULE: &str = "pyhost_state_fixture";

fn classifier(batch_size: usize) -> MlState {
    MlState::new(
        MlParams::new(MODULE, "Classifier")
            .with_module_path(FIXTURES)
            .with_batch_size(batch_size),
    )
    .unwrap()
}

fn row(label: &str) -> Value {
    let mut map = Map::default();
    map.insert("label".to_string(), Value::from(label));
    map.insert("x".to_string(), Value::Float(0.5));
    Value::Map(map)
}

fn params(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn fitted_batches(state: &MlState) -> Value {
    state.call("fitted_batches", &[]).unwrap()
}

#[test]
fn constructor_receives_model_path_and_gpu() {
    let state = MlState::new(
        MlParams::new(MODULE, "Classifier")
            .with_module_path(FIXTURES)
            .with_model_path("model.bin")
            .with_gpu_id(2),
    )
    .unwrap();
    assert_eq!(
        state.call("constructed_with", &[]).unwrap(),
        Value::Array(vec![Value::from("model.bin"), Value::Int(2)])
    );
}

#[test]
fn writes_fit_once_the_batch_is_full() {
    let state = classifier(3);
    assert_eq!(state.write(&row("a")).unwrap(), None);
    assert_eq!(state.write(&row("b")).unwrap(), None);
    assert_eq!(state.pending(), 2);
    assert_eq!(fitted_batches(&state), Value::Array(vec![]));

    let result = state.write(&row("a")).unwrap().unwrap();
    assert_eq!(result.get("loss").unwrap(), &Value::Float(1.5));
    assert_eq!(state.pending(), 0);
    assert_eq!(fitted_batches(&state), Value::Array(vec![Value::Int(3)]));

    // The emptied batch fills up again from scratch.
    for label in ["b", "b"] {
        assert!(state.write(&row(label)).unwrap().is_none());
    }
    assert_eq!(state.pending(), 2);
    assert!(state.write(&row("b")).unwrap().is_some());
    assert_eq!(
        fitted_batches(&state),
        Value::Array(vec![Value::Int(3), Value::Int(3)])
    );
}

#[test]
fn failed_fit_still_empties_the_batch() {
    let state = classifier(2);
    state.write(&Value::Int(1)).unwrap();
    let err = state.write(&Value::Int(2)).unwrap_err();
    assert!(err.to_string().contains("TypeError"), "{}", err);
    assert_eq!(state.pending(), 0);
}

#[test]
fn predict_uses_the_fitted_model() {
    let state = classifier(10);
    assert_eq!(state.predict(&row("?")).unwrap(), Value::Null);

    let rows: Vec<Map> = ["a", "b", "b"]
        .iter()
        .map(|l| row(l).into_map().unwrap())
        .collect();
    state.fit_maps(&rows).unwrap();
    assert_eq!(state.predict(&row("?")).unwrap(), Value::from("b"));
    assert_eq!(state.pending(), 0);
}

#[test]
fn save_and_load_blob() {
    let state = classifier(2);
    state.write(&row("x")).unwrap();
    state.write(&row("x")).unwrap();

    let mut saved = Vec::new();
    state.save(&mut saved, &Map::default()).unwrap();
    assert_eq!(saved, br#"{"x": 2}"#.to_vec());

    let fresh = classifier(2);
    fresh.load(&mut Cursor::new(&saved), &Map::default()).unwrap();
    assert_eq!(fresh.predict(&Value::Null).unwrap(), Value::from("x"));
}

#[test]
fn save_must_return_a_blob() {
    let state = MlState::new(MlParams::new(MODULE, "TextSave").with_module_path(FIXTURES)).unwrap();
    assert!(matches!(
        state.save(&mut Vec::new(), &Map::default()),
        Err(StateError::InvalidSaveResult("string"))
    ));
}

#[test]
fn terminate_drops_pending_rows() {
    let state = classifier(5);
    state.write(&row("a")).unwrap();
    state.terminate().unwrap();
    state.terminate().unwrap();
    assert!(state.is_terminated());
    assert_eq!(state.pending(), 0);
    assert!(matches!(
        state.write(&row("a")),
        Err(StateError::AlreadyTerminated)
    ));
    assert!(matches!(
        state.predict(&Value::Null),
        Err(StateError::AlreadyTerminated)
    ));
}

#[test]
fn registry_creates_and_loads_ml_states() {
    let registry = CreatorRegistry::builtin();
    let create = params(&[
        ("module_path", Value::from(FIXTURES)),
        ("module_name", Value::from(MODULE)),
        ("class_name", Value::from("Classifier")),
        ("batch_train_size", Value::Int(1)),
    ]);
    let state = registry.create(ML_STATE, &create).unwrap();
    state.write(&row("z")).unwrap();
    assert!(matches!(&state, SharedState::Ml(ml) if ml.pending() == 0));

    let mut saved = Vec::new();
    state.save(&mut saved, &Map::default()).unwrap();

    let err = registry
        .load(ML_STATE, &mut Cursor::new(&saved), &create)
        .unwrap_err();
    assert!(matches!(err, StateError::MissingParam("model_file_path")));

    let mut load = create.clone();
    load.insert("model_file_path".to_string(), Value::from(""));
    let loaded = registry
        .load(ML_STATE, &mut Cursor::new(&saved), &load)
        .unwrap();
    assert_eq!(loaded.call("predict", &[Value::Null]).unwrap(), Value::from("z"));
    assert!(MlCreator.create_state(&load).is_ok());
}

#[test]
fn stored_states_serve_fit_and_predict() {
    let states = SharedStates::new();
    states
        .add("model", SharedState::Ml(classifier(100)))
        .unwrap();
    assert!(matches!(
        states.add("model", SharedState::Ml(classifier(1))),
        Err(StateError::StateExists(_))
    ));

    let rows = vec![row("q").into_map().unwrap(), row("q").into_map().unwrap()];
    let result = states.ml_fit("model", &rows).unwrap();
    assert_eq!(result.get("accuracy").unwrap(), &Value::Float(2.0));
    assert_eq!(states.ml_predict("model", &Value::Null).unwrap(), Value::from("q"));

    let counter = CreatorRegistry::builtin()
        .create(
            "pystate",
            &params(&[
                ("module_path", Value::from(FIXTURES)),
                ("module_name", Value::from(MODULE)),
                ("class_name", Value::from("NoArgs")),
            ]),
        )
        .unwrap();
    states.add("plain", counter).unwrap();
    assert!(matches!(
        states.ml_predict("plain", &Value::Null),
        Err(StateError::NotMlState(ref n)) if n == "plain"
    ));
    assert!(matches!(
        states.get("plain").unwrap().write(&Value::Null),
        Err(StateError::NotWritable)
    ));
    assert_eq!(states.names(), vec!["model".to_string(), "plain".to_string()]);
}
