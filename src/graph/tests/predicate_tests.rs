//! Predicate clause evaluation tests.

use crate::graph::domain::{ConditionOp, FieldType, PredicateClause, evaluate_all};
use rstest::rstest;
use serde_json::{Map, Value, json};

fn responses(value: Value) -> Map<String, Value> {
    value
        .as_object()
        .cloned()
        .expect("test responses must be an object")
}

#[rstest]
#[case(json!({"verified": "yes"}), true)]
#[case(json!({"verified": "no"}), false)]
#[case(json!({}), false)]
fn string_equality(#[case] given: Value, #[case] expected: bool) {
    let clause =
        PredicateClause::new("verified", FieldType::String, json!("yes"), ConditionOp::Eq);
    assert_eq!(clause.evaluate(&responses(given)), expected);
}

#[rstest]
#[case(ConditionOp::Gt, json!(18), true)]
#[case(ConditionOp::Ge, json!(21), true)]
#[case(ConditionOp::Lt, json!(21), false)]
#[case(ConditionOp::Le, json!(20), false)]
#[case(ConditionOp::Ne, json!(18), true)]
fn integer_comparisons_coerce_string_responses(
    #[case] condition: ConditionOp,
    #[case] value: Value,
    #[case] expected: bool,
) {
    let clause = PredicateClause::new("age", FieldType::Integer, value, condition);
    let given = responses(json!({"age": "21"}));
    assert_eq!(clause.evaluate(&given), expected);
}

#[rstest]
fn boolean_coercion_accepts_text_forms() {
    let clause =
        PredicateClause::new("agreed", FieldType::Boolean, json!(true), ConditionOp::Eq);
    assert!(clause.evaluate(&responses(json!({"agreed": "true"}))));
    assert!(clause.evaluate(&responses(json!({"agreed": true}))));
    assert!(!clause.evaluate(&responses(json!({"agreed": "false"}))));
}

#[rstest]
fn number_comparison_handles_decimal_strings() {
    let clause = PredicateClause::new("score", FieldType::Number, json!(7.5), ConditionOp::Ge);
    assert!(clause.evaluate(&responses(json!({"score": "8.25"}))));
    assert!(!clause.evaluate(&responses(json!({"score": "7.49"}))));
}

#[rstest]
fn in_is_substring_for_string_pairs() {
    let clause = PredicateClause::new(
        "city",
        FieldType::String,
        json!("Bishkek, Osh, Naryn"),
        ConditionOp::In,
    );
    assert!(clause.evaluate(&responses(json!({"city": "Osh"}))));
    assert!(!clause.evaluate(&responses(json!({"city": "Karakol"}))));
}

#[rstest]
fn in_is_membership_for_arrays() {
    let clause = PredicateClause::new(
        "oik",
        FieldType::Integer,
        json!([4, 5]),
        ConditionOp::In,
    );
    assert!(clause.evaluate(&responses(json!({"oik": 4}))));
    assert!(clause.evaluate(&responses(json!({"oik": "5"}))));
    assert!(!clause.evaluate(&responses(json!({"oik": 6}))));
}

#[rstest]
fn nin_negates_membership() {
    let clause = PredicateClause::new(
        "oik",
        FieldType::Integer,
        json!([4, 5]),
        ConditionOp::Nin,
    );
    assert!(!clause.evaluate(&responses(json!({"oik": 4}))));
    assert!(clause.evaluate(&responses(json!({"oik": 9}))));
}

#[rstest]
fn empty_clause_list_passes_unconditionally() {
    assert!(evaluate_all(&[], &responses(json!({}))));
    assert!(evaluate_all(&[], &responses(json!({"anything": 1}))));
}

#[rstest]
fn clause_list_is_logical_and() {
    let clauses = vec![
        PredicateClause::new("verified", FieldType::String, json!("yes"), ConditionOp::Eq),
        PredicateClause::new("age", FieldType::Integer, json!(18), ConditionOp::Ge),
    ];
    assert!(evaluate_all(
        &clauses,
        &responses(json!({"verified": "yes", "age": 30}))
    ));
    assert!(!evaluate_all(
        &clauses,
        &responses(json!({"verified": "yes", "age": 17}))
    ));
    assert!(!evaluate_all(
        &clauses,
        &responses(json!({"verified": "no", "age": 30}))
    ));
}

#[rstest]
fn operator_serde_uses_symbolic_names() {
    let clause = PredicateClause::new("x", FieldType::Integer, json!(1), ConditionOp::Ge);
    let encoded = serde_json::to_value(&clause).expect("clause should serialise");
    assert_eq!(encoded["condition"], json!(">="));
    assert_eq!(encoded["type"], json!("integer"));
}
