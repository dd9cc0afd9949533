use super::*;

fn params(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_extract_defaults() {
    let p = MlParams::extract(&params(&[
        ("module_name", Value::from("models")),
        ("class_name", Value::from("Model")),
    ]))
    .unwrap();
    assert_eq!(p, MlParams::new("models", "Model"));
    assert_eq!(p.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(p.gpu_id, -1);
    assert!(p.model_path.is_empty());
    assert!(p.module_path.is_empty());
}

#[test]
fn test_extract_all() {
    let p = MlParams::extract(&params(&[
        ("module_path", Value::from("/srv/py")),
        ("module_name", Value::from("models")),
        ("class_name", Value::from("Model")),
        ("batch_train_size", Value::Int(3)),
        ("model_file_path", Value::from("model.bin")),
        ("gpu_id", Value::Int(0)),
    ]))
    .unwrap();
    let expected = MlParams::new("models", "Model")
        .with_module_path("/srv/py")
        .with_batch_size(3)
        .with_model_path("model.bin")
        .with_gpu_id(0);
    assert_eq!(p, expected);
}

#[test]
fn test_batch_size_must_be_positive() {
    for n in [0, -4] {
        let err = MlParams::extract(&params(&[
            ("module_name", Value::from("models")),
            ("class_name", Value::from("Model")),
            ("batch_train_size", Value::Int(n)),
        ]))
        .unwrap_err();
        assert!(matches!(err, StateError::InvalidBatchSize(m) if m == n));
    }
}

#[test]
fn test_invalid_param_types() {
    let err = MlParams::extract(&params(&[
        ("module_name", Value::from("models")),
        ("class_name", Value::from("Model")),
        ("batch_train_size", Value::from("10")),
    ]))
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'batch_train_size' parameter must be an int, not string"
    );

    let err = MlParams::extract(&params(&[("class_name", Value::from("Model"))])).unwrap_err();
    assert!(matches!(err, StateError::MissingParam("module_name")));
}
