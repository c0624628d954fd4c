//! Response validation tests.

use crate::routing::error::EngineError;
use crate::routing::services::validate_responses;
use serde_json::{Map, Value, json};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer", "minimum": 0}
        },
        "required": ["name", "age"]
    })
}

fn responses(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

#[test]
fn conforming_responses_pass() {
    let body = responses(&[("name", json!("ada")), ("age", json!(36))]);
    assert!(validate_responses(&schema(), &body).is_ok());
}

#[test]
fn violations_carry_the_instance_pointer() {
    let body = responses(&[("name", json!("ada")), ("age", json!("old"))]);
    let error = validate_responses(&schema(), &body).expect_err("type violation");
    let EngineError::ValidationFailure { message, pass } = error else {
        panic!("expected a validation failure");
    };
    assert_eq!(pass.as_deref(), Some("/age"));
    assert!(message.contains("integer"), "unexpected message: {message}");
}

#[test]
fn missing_required_fields_report_at_the_root() {
    let body = responses(&[("name", json!("ada"))]);
    let error = validate_responses(&schema(), &body).expect_err("missing field");
    let EngineError::ValidationFailure { pass, .. } = error else {
        panic!("expected a validation failure");
    };
    assert!(pass.is_none());
}

#[test]
fn malformed_schemas_surface_as_failures() {
    let broken = json!({"type": "no-such-type"});
    let error = validate_responses(&broken, &Map::new()).expect_err("compile failure");
    assert!(matches!(error, EngineError::ValidationFailure { pass: None, .. }));
}
