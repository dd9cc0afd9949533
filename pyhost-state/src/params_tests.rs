use super::*;

fn params(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_required_only() {
    let mut map = params(&[
        (MODULE_NAME, Value::from("mod")),
        (CLASS_NAME, Value::from("Cls")),
    ]);
    let bp = BaseParams::extract(&mut map, false).unwrap();
    assert_eq!(bp, BaseParams::new("mod", "Cls"));
    assert!(!bp.is_writable());
    assert_eq!(map.len(), 2);
}

#[test]
fn test_all_keys_removed() {
    let mut map = params(&[
        (MODULE_PATH, Value::from("/srv/py")),
        (MODULE_NAME, Value::from("mod")),
        (CLASS_NAME, Value::from("Cls")),
        (WRITE_METHOD, Value::from("write")),
        ("v1", Value::Int(1)),
    ]);
    let bp = BaseParams::extract(&mut map, true).unwrap();
    assert_eq!(
        bp,
        BaseParams::new("mod", "Cls")
            .with_module_path("/srv/py")
            .with_write_method("write")
    );
    assert!(bp.is_writable());
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("v1"), Some(&Value::Int(1)));
}

#[test]
fn test_missing_required() {
    let mut map = params(&[(CLASS_NAME, Value::from("Cls"))]);
    let err = BaseParams::extract(&mut map, true).unwrap_err();
    assert!(matches!(err, StateError::MissingParam(MODULE_NAME)));
    assert_eq!(map.len(), 1);

    let mut map = params(&[(MODULE_NAME, Value::from("mod"))]);
    assert!(matches!(
        BaseParams::extract(&mut map, true),
        Err(StateError::MissingParam(CLASS_NAME))
    ));
}

#[test]
fn test_non_string_params() {
    let mut map = params(&[
        (MODULE_NAME, Value::from("mod")),
        (CLASS_NAME, Value::Int(3)),
    ]);
    let err = BaseParams::extract(&mut map, false).unwrap_err();
    assert_eq!(err.to_string(), "'class_name' parameter must be a string, not int");

    let mut map = params(&[
        (MODULE_NAME, Value::from("mod")),
        (CLASS_NAME, Value::from("Cls")),
        (WRITE_METHOD, Value::Null),
    ]);
    assert!(matches!(
        BaseParams::extract(&mut map, false),
        Err(StateError::InvalidParam { key: WRITE_METHOD, .. })
    ));
}
