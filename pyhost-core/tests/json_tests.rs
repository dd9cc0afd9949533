//! Property tests for the JSON mapping of values

use proptest::prelude::*;
use pyhost_core::{Map, Value};

fn json_safe_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Map(m.into_iter().collect::<Map>())),
        ]
    })
}

proptest! {
    #[test]
    fn json_round_trip(v in json_safe_value()) {
        let text = v.to_json().to_string();
        let back = Value::parse_json(&text).unwrap();
        prop_assert_eq!(back, v);
    }
}

#[test]
fn long_decimal_floats_survive_text() {
    let value = Value::Array(vec![Value::Map(
        [("a".to_string(), Value::Float(527243076.99567115))]
            .into_iter()
            .collect::<Map>(),
    )]);
    let text = value.to_json().to_string();
    assert_eq!(Value::parse_json(&text).unwrap(), value);

    for x in [0.1, 1.0 / 3.0, 2.2250738585072014e-308, 123456789.12345678] {
        let back = Value::parse_json(&Value::Float(x).to_json().to_string()).unwrap();
        assert_eq!(back, Value::Float(x));
    }
}
