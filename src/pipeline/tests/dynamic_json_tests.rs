//! Dynamic-json schema reshaping tests.

use crate::pipeline::domain::DynamicJson;
use rstest::rstest;
use serde_json::{Map, Value, json};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "slot": {"type": "string", "enum": ["morning", "noon", "evening"]},
            "room": {"type": "string", "enum": ["r1", "r2", "r3"]}
        }
    })
}

fn rows(values: &[Value]) -> Vec<Map<String, Value>> {
    values
        .iter()
        .map(|value| {
            value
                .as_object()
                .cloned()
                .expect("test row must be an object")
        })
        .collect()
}

fn enum_of(schema: &Value, field: &str) -> Vec<Value> {
    schema["properties"][field]["enum"]
        .as_array()
        .cloned()
        .expect("enum must remain an array")
}

#[rstest]
fn count_one_removes_an_option_after_first_use() {
    let rule = DynamicJson::new("slot", 1);
    let mut target = schema();

    rule.reshape(&mut target, &rows(&[json!({"slot": "noon"})]), None);

    assert_eq!(enum_of(&target, "slot"), vec![json!("morning"), json!("evening")]);
}

#[rstest]
fn options_below_the_threshold_survive_in_declaration_order() {
    let rule = DynamicJson::new("slot", 2);
    let mut target = schema();
    let source = rows(&[
        json!({"slot": "evening"}),
        json!({"slot": "morning"}),
        json!({"slot": "evening"}),
    ]);

    rule.reshape(&mut target, &source, None);

    assert_eq!(enum_of(&target, "slot"), vec![json!("morning"), json!("noon")]);
}

#[rstest]
fn count_zero_disables_filtering() {
    let rule = DynamicJson::new("slot", 0);
    let mut target = schema();

    rule.reshape(&mut target, &rows(&[json!({"slot": "noon"})]), None);

    assert_eq!(
        enum_of(&target, "slot"),
        vec![json!("morning"), json!("noon"), json!("evening")]
    );
}

#[rstest]
fn foreign_values_drop_only_alongside_the_chosen_main() {
    let rule = DynamicJson::new("slot", 0).with_foreign(["room"]);
    let mut target = schema();
    let source = rows(&[
        json!({"slot": "noon", "room": "r1"}),
        json!({"slot": "morning", "room": "r2"}),
        json!({"slot": "noon", "room": "r3"}),
    ]);
    let current = map(json!({"slot": "noon"}));

    rule.reshape(&mut target, &source, Some(&current));

    // r2 was taken under a different main value and stays available.
    assert_eq!(enum_of(&target, "room"), vec![json!("r2")]);
}

#[rstest]
fn without_a_chosen_main_foreign_enums_are_untouched() {
    let rule = DynamicJson::new("slot", 0).with_foreign(["room"]);
    let mut target = schema();
    let source = rows(&[json!({"slot": "noon", "room": "r1"})]);

    rule.reshape(&mut target, &source, None);

    assert_eq!(enum_of(&target, "room"), vec![json!("r1"), json!("r2"), json!("r3")]);
}

#[rstest]
fn population_mode_replaces_the_enum_in_first_seen_order() {
    let rule = DynamicJson::new("slot", 0).obtaining_options();
    let mut target = schema();
    let source = rows(&[
        json!({"slot": "night"}),
        json!({"slot": "dawn"}),
        json!({"slot": "night"}),
    ]);

    rule.reshape(&mut target, &source, None);

    assert_eq!(enum_of(&target, "slot"), vec![json!("night"), json!("dawn")]);
}

fn map(value: Value) -> Map<String, Value> {
    value
        .as_object()
        .cloned()
        .expect("test value must be an object")
}
