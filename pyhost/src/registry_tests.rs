use super::*;

fn dumps() -> PyFunc {
    PyFunc::new("dumps", "", "json", "dumps")
}

#[test]
fn test_register_and_call() {
    let registry = FunctionRegistry::new();
    registry.register(dumps()).unwrap();
    assert!(registry.contains("dumps"));
    let out = registry.call("dumps", &[Value::Array(vec![Value::Int(1)])]).unwrap();
    assert_eq!(out, Value::from("[1]"));
}

#[test]
fn test_duplicate_name_rejected() {
    let registry = FunctionRegistry::new();
    registry.register(dumps()).unwrap();
    let err = registry.register(dumps()).unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered(ref name) if name == "dumps"));

    let err = registry
        .register_py_func("dumps", "", "json", "loads")
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered(_)));
}

#[test]
fn test_names_and_unregister() {
    let registry = FunctionRegistry::new();
    registry
        .register(PyFunc::new("b", "", "json", "dumps"))
        .unwrap();
    registry
        .register(PyFunc::new("a", "", "json", "loads"))
        .unwrap();
    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

    let removed = registry.unregister("a").unwrap();
    assert_eq!(removed.func_name(), "loads");
    assert_eq!(registry.names(), vec!["b".to_string()]);
    assert!(matches!(
        registry.call("a", &[]),
        Err(Error::NotRegistered(ref name)) if name == "a"
    ));
    assert!(registry.unregister("a").is_err());
}

#[test]
fn test_register_py_func_imports_eagerly() {
    let registry = FunctionRegistry::new();
    let err = registry
        .register_py_func("missing", "", "pyhost_no_such_module", "f")
        .unwrap_err();
    assert!(err.to_string().contains("ModuleNotFoundError"));
    assert!(!registry.contains("missing"));

    registry
        .register_py_func("loads", "", "json", "loads")
        .unwrap();
    let expected: Value = [("k", Value::Array(vec![Value::Bool(true)]))]
        .into_iter()
        .collect();
    assert_eq!(
        registry.call("loads", &[Value::from("{\"k\": [true]}")]).unwrap(),
        expected
    );
}

#[test]
fn test_lazy_import_failure_is_retried() {
    let func = PyFunc::new("broken", "", "pyhost_no_such_module", "f");
    assert!(func.call(&[]).is_err());
    assert!(func.call(&[]).is_err());
    assert_eq!(func.module_name(), "pyhost_no_such_module");
}
