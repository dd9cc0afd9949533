use super::*;

#[test]
fn test_empty_store() {
    let states = SharedStates::new();
    assert!(states.names().is_empty());
    assert!(matches!(
        states.get("model"),
        Err(StateError::StateNotFound(ref n)) if n == "model"
    ));
    assert!(matches!(
        states.remove("model"),
        Err(StateError::StateNotFound(_))
    ));
}

#[test]
fn test_ml_entry_points_need_a_stored_state() {
    let states = SharedStates::new();
    assert!(matches!(
        states.ml_fit("model", &[Map::default()]),
        Err(StateError::StateNotFound(_))
    ));
    assert!(matches!(
        states.ml_predict("model", &Value::Null),
        Err(StateError::StateNotFound(_))
    ));
}
