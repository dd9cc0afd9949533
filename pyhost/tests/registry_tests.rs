//! Functions registered from a script directory

use pyhost::{FunctionRegistry, PyFunc, Value};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/python");

#[test]
fn register_from_module_path() {
    let registry = FunctionRegistry::new();
    registry
        .register_py_func("echo", FIXTURES, "pyhost_convert", "echo")
        .unwrap();
    registry
        .register(PyFunc::new("tname", FIXTURES, "pyhost_convert", "type_name"))
        .unwrap();

    assert_eq!(registry.names(), vec!["echo".to_string(), "tname".to_string()]);
    assert_eq!(
        registry.call("echo", &[Value::from("hi")]).unwrap(),
        Value::from("hi")
    );
    assert_eq!(
        registry.call("tname", &[Value::Blob(vec![])]).unwrap(),
        Value::from("bytearray")
    );
}

#[test]
fn registered_function_errors_name_the_call() {
    let registry = FunctionRegistry::new();
    registry
        .register(PyFunc::new("missing", FIXTURES, "pyhost_convert", "no_such_function"))
        .unwrap();
    let err = registry.call("missing", &[]).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("fail to get 'no_such_function' function: AttributeError"));
}

#[test]
fn registry_is_shared_between_threads() {
    let registry = std::sync::Arc::new(FunctionRegistry::new());
    registry
        .register_py_func("echo", FIXTURES, "pyhost_convert", "echo")
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.call("echo", &[Value::Int(i)]).unwrap())
        })
        .collect();
    let mut results: Vec<i64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().as_int().unwrap())
        .collect();
    results.sort();
    assert_eq!(results, vec![0, 1, 2, 3]);
}
