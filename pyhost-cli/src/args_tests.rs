use super::*;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_values() {
    let values = parse_values(&strings(&["1", "\"a\"", "[true, null]", "{\"k\": 2.5}"])).unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values[0], Value::Int(1));
    assert_eq!(values[1], Value::String("a".to_string()));
    assert_eq!(values[2], Value::Array(vec![Value::Bool(true), Value::Null]));
    assert_eq!(values[3].get("k").unwrap(), &Value::Float(2.5));
}

#[test]
fn test_parse_values_reports_position() {
    let err = parse_values(&strings(&["1", "abc"])).unwrap_err();
    assert_eq!(err.to_string(), "argument 2 is not valid JSON: abc");
}

#[test]
fn test_parse_array() {
    assert!(parse_array(None, "--init").unwrap().is_empty());
    assert_eq!(
        parse_array(Some("[1, \"x\"]"), "--init").unwrap(),
        vec![Value::Int(1), Value::String("x".to_string())]
    );
    let err = parse_array(Some("{}"), "--init").unwrap_err();
    assert_eq!(err.to_string(), "--init must be a JSON array, got map");
}

#[test]
fn test_parse_map() {
    assert!(parse_map(None, "--kwargs").unwrap().is_none());
    let map = parse_map(Some("{\"a\": 1}"), "--kwargs").unwrap().unwrap();
    assert_eq!(map.get("a"), Some(&Value::Int(1)));
    assert!(parse_map(Some("[1]"), "--kwargs").is_err());
    assert!(parse_map(Some("{"), "--kwargs").is_err());
}

#[test]
fn test_log_filter() {
    assert_eq!(log_filter(0), "warn");
    assert_eq!(log_filter(1), "info");
    assert_eq!(log_filter(2), "debug");
    assert_eq!(log_filter(9), "trace");
}
