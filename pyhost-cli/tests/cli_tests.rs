//! Running the `pyhost` binary against the Python fixtures

use std::process::{Command, Output};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../pyhost/tests/python");

fn pyhost(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pyhost"))
        .env_remove("PYHOST_CONFIG")
        .env_remove("RUST_LOG")
        .arg("-p")
        .arg(FIXTURES)
        .args(args)
        .output()
        .expect("run pyhost")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "pyhost failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

#[test]
fn call_prints_json_result() {
    let output = pyhost(&["call", "pyhost_convert", "echo", r#"{"a": [1, 2.5, null]}"#]);
    assert_eq!(stdout(&output), r#"{"a":[1,2.5,null]}"#);

    let output = pyhost(&["call", "builtins", "len", r#""abcd""#]);
    assert_eq!(stdout(&output), "4");
}

#[test]
fn invoke_constructs_and_calls() {
    let output = pyhost(&[
        "invoke",
        "pyhost_instance",
        "PythonTest2",
        "get_a",
        "--init",
        r#"["from init"]"#,
    ]);
    assert_eq!(stdout(&output), r#""from init""#);

    let output = pyhost(&["invoke", "pyhost_instance", "PythonTest", "logger", r#""x""#]);
    assert_eq!(stdout(&output), r#""initialized_x""#);
}

#[test]
fn invoke_with_named_arguments() {
    let output = pyhost(&[
        "invoke",
        "builtins",
        "dict",
        "get",
        "--init",
        r#"[{"k": 3}]"#,
        r#""k""#,
    ]);
    assert_eq!(stdout(&output), "3");

    let output = pyhost(&[
        "invoke",
        "collections",
        "Counter",
        "most_common",
        "--init",
        r#"["aab"]"#,
        "--kwargs",
        r#"{"n": 1}"#,
    ]);
    assert_eq!(stdout(&output), r#"[["a",2]]"#);
}

#[test]
fn eval_json_round_trips() {
    let output = pyhost(&["eval-json", r#"[true, "s", {"k": -1}]"#]);
    assert_eq!(stdout(&output), r#"[true,"s",{"k":-1}]"#);
}

#[test]
fn python_errors_fail_the_command() {
    let output = pyhost(&["call", "pyhost_errors", "raise_value_error"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ValueError"), "{}", stderr);

    let output = pyhost(&["call", "pyhost_convert", "echo", "not json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("argument 1 is not valid JSON"), "{}", stderr);
}

#[test]
fn config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pyhost.json");
    pyhost_core::RuntimeConfig::new()
        .with_search_path(FIXTURES)
        .to_file(&path)
        .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pyhost"))
        .arg("--config")
        .arg(&path)
        .args(["call", "pyhost_convert", "echo", "7"])
        .output()
        .unwrap();
    assert_eq!(stdout(&output), "7");
}
