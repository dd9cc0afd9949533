//! Modules, classes and instances defined in fixture scripts

use pyhost::{load_module, Error, Instance, Map, Module, Value};

fn fixtures() -> Module {
    pyhost::append_sys_path([concat!(env!("CARGO_MANIFEST_DIR"), "/tests/python")]).unwrap();
    load_module("pyhost_instance").unwrap()
}

fn kwargs(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn instance_keeps_state_between_calls() {
    let m = fixtures();
    let ins = m.new_instance("PythonTest", &[], None).unwrap();
    assert_eq!(ins.origin(), "pyhost_instance.PythonTest");
    assert_eq!(ins.call("logger", &[Value::from("a")]).unwrap(), Value::from("initialized_a"));
    assert_eq!(
        ins.call("logger", &[Value::from("b")]).unwrap(),
        Value::from("initialized_a_b")
    );
    assert_eq!(ins.get_attr("a").unwrap(), Value::from("initialized_a_b"));
}

#[test]
fn constructor_arguments() {
    let m = fixtures();
    let ins = m
        .new_instance("PythonTest2", &[Value::from("given")], None)
        .unwrap();
    assert_eq!(ins.call("get_a", &[]).unwrap(), Value::from("given"));

    let err = m.new_instance("PythonTest2", &[], None).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("fail to create 'PythonTest2' instance: TypeError"),
        "{}",
        err
    );
}

#[test]
fn constructor_keyword_arguments() {
    let m = fixtures();
    let cases = [
        (
            kwargs(&[
                ("a", Value::from("v1")),
                ("b", Value::Int(6)),
                ("c", Value::Float(100.0)),
                ("d", Value::Bool(true)),
            ]),
            "v1_6_100.0_True_",
        ),
        (
            kwargs(&[("a", Value::from("v1")), ("e", Value::Int(7))]),
            "v1_5___7",
        ),
        (kwargs(&[("a", Value::from("v1"))]), "v1_5___"),
    ];
    for (kw, expected) in cases {
        let ins = m.new_instance("PythonTestForKwd", &[], Some(&kw)).unwrap();
        assert_eq!(ins.call("confirm_init", &[]).unwrap(), Value::from(expected));
    }

    // Positional and keyword arguments together.
    let ins = m
        .new_instance(
            "PythonTestForKwd",
            &[Value::from("p")],
            Some(&kwargs(&[("c", Value::from("x"))])),
        )
        .unwrap();
    assert_eq!(ins.call("confirm_init", &[]).unwrap(), Value::from("p_5_x__"));
}

#[test]
fn class_and_static_methods() {
    let m = fixtures();
    let class = m.get_class("PythonTest3").unwrap();
    assert_eq!(class.call("get_static_value", &[]).unwrap(), Value::from("class_value"));
    assert_eq!(class.call("get_class_value", &[]).unwrap(), Value::from("class_value"));

    let child = m.get_class("ChildClass").unwrap();
    assert_eq!(child.call("get_class_value", &[]).unwrap(), Value::from("instance_value"));
    assert_eq!(child.call("get_static_value", &[]).unwrap(), Value::from("class_value"));
}

#[test]
fn call_direct_returns_instances() {
    let m = fixtures();
    let class = m.get_class("PythonTest3").unwrap();

    let ins = Instance::from(class.call_direct("get_instance", &[]).unwrap());
    assert_eq!(
        ins.call("get_instance_str", &[]).unwrap(),
        Value::from("instance method test1")
    );

    let obj = class
        .call_direct_with_kwargs(
            "get_instance2",
            &[Value::Int(1)],
            &kwargs(&[("v1", Value::from("kw"))]),
        )
        .unwrap();
    let ins = Instance::from_object("pyhost_instance.PythonTest3", obj);
    assert_eq!(ins.call("confirm", &[]).unwrap(), Value::from("1_5_kw"));

    let err = class
        .call_with_kwargs(
            "get_instance2",
            &[],
            &kwargs(&[("a", Value::Int(2)), ("b", Value::Int(3)), ("v1", Value::Null)]),
        )
        .unwrap_err();
    // An instance has no value representation.
    assert!(matches!(err.root_cause(), Error::UnsupportedType(t) if t == "PythonTest3"));
}

#[test]
fn undefined_method_is_attribute_error() {
    let m = fixtures();
    let ins = m.new_instance("PythonTest", &[], None).unwrap();
    let err = ins.call("no_such_method", &[]).unwrap_err();
    let exc = err.python_exception().expect("python exception");
    assert!(exc.main_message().starts_with("AttributeError"));
    assert!(exc.main_message().contains("no_such_method"));
}

#[test]
fn wrong_arity_is_type_error() {
    let m = fixtures();
    let ins = m.new_instance("PythonTest", &[], None).unwrap();
    let err = ins.call("logger", &[]).unwrap_err();
    assert!(
        err.to_string().starts_with("fail to call 'logger' method: TypeError"),
        "{}",
        err
    );
}

#[test]
fn module_attribute_that_is_not_callable() {
    let m = fixtures();
    let err = m.call("not_callable", &[]).unwrap_err();
    assert!(matches!(err.root_cause(), Error::NotCallable(n) if n == "not_callable"));
    assert!(m.get_function("not_callable").is_err());
}

#[test]
fn release_is_idempotent_across_handles() {
    let m = fixtures();
    let mut ins = m.new_instance("PythonTest", &[], None).unwrap();
    ins.release().unwrap();
    ins.release().unwrap();
    assert!(ins.object().is_null());
    assert!(matches!(ins.call("logger", &[Value::from("x")]), Err(Error::Released(_))));

    let mut module = fixtures();
    module.release().unwrap();
    module.release().unwrap();
    assert!(matches!(module.get_class("PythonTest"), Err(Error::Released(_))));
}

#[test]
fn instances_dropped_on_other_threads() {
    let m = fixtures();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ins = m.new_instance("PythonTest", &[], None).unwrap();
            std::thread::spawn(move || {
                let logged = ins.call("logger", &[Value::from("t")]).unwrap();
                assert_eq!(logged, Value::from("initialized_t"));
                drop(ins);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
