//! Template injection scanner tests.

use crate::graph::domain::StageId;
use crate::task::domain::UserId;
use crate::webhook::domain::{InjectionContext, inject_text, inject_value, referenced_stages};
use rstest::rstest;
use serde_json::{Map, Value, json};

fn map(value: Value) -> Map<String, Value> {
    value
        .as_object()
        .cloned()
        .expect("test value must be an object")
}

fn context() -> InjectionContext {
    InjectionContext {
        user: Some(UserId::new()),
        responses: map(json!({"name": "kloop", "score": 7})),
        internal_metadata: map(json!({"secret": "s1"})),
        in_task_responses: map(json!({"origin": "north"})),
        ..InjectionContext::new()
    }
}

#[rstest]
fn bare_user_id_splices_into_a_url() {
    let ctx = context();
    let user = ctx.user.expect("context has a user");

    let url = inject_text("https://api.test/users/@TURNIP_USER_ID/profile", &ctx);

    assert_eq!(url, format!("https://api.test/users/{user}/profile"));
}

#[rstest]
fn bare_responses_marker_splices_as_json_text() {
    let ctx = context();

    let url = inject_text("https://api.test/submit?data=@TURNIP_RESPONSES", &ctx);

    assert_eq!(
        url,
        "https://api.test/submit?data={\"name\":\"kloop\",\"score\":7}"
    );
}

#[rstest]
fn whole_string_marker_substitutes_raw_json() {
    let ctx = context();

    let injected = inject_value(&json!({"payload": "@TURNIP_RESPONSES"}), &ctx);

    assert_eq!(injected, json!({"payload": {"name": "kloop", "score": 7}}));
}

#[rstest]
fn parameterised_field_reads_the_current_task() {
    let ctx = context();
    let template = json!({"who": {"@TURNIP_RESPONSES": {"field": "name"}}});

    let injected = inject_value(&template, &ctx);

    assert_eq!(injected, json!({"who": "kloop"}));
}

#[rstest]
fn in_task_reference_reads_the_predecessor() {
    let ctx = context();
    let template =
        json!({"from": {"@TURNIP_RESPONSES": {"stage": "in_task", "field": "origin"}}});

    let injected = inject_value(&template, &ctx);

    assert_eq!(injected, json!({"from": "north"}));
}

#[rstest]
fn stage_reference_reads_the_prefetched_stage_map() {
    let stage = StageId::new();
    let mut ctx = context();
    ctx.stage_responses
        .insert(stage, map(json!({"city": "osh"})));
    let template = Value::String(format!(
        "city={{\"@TURNIP_RESPONSES\": {{\"stage\": \"{stage}\", \"field\": \"city\"}}}}"
    ));

    let injected = inject_value(&template, &ctx);

    assert_eq!(injected, Value::String("city=osh".to_owned()));
}

#[rstest]
fn internal_meta_marker_reads_the_metadata_map() {
    let ctx = context();
    let template = json!({"token": {"@TURNIP_INTERNAL_META": {"field": "secret"}}});

    let injected = inject_value(&template, &ctx);

    assert_eq!(injected, json!({"token": "s1"}));
}

#[rstest]
fn unknown_markers_and_missing_fields_resolve_to_null() {
    let ctx = context();

    let unknown = inject_value(&json!({"@TURNIP_NO_SUCH": {}}), &ctx);
    let missing = inject_value(&json!({"@TURNIP_RESPONSES": {"field": "absent"}}), &ctx);

    assert_eq!(unknown, Value::Null);
    assert_eq!(missing, Value::Null);
}

#[rstest]
fn plain_braces_are_left_alone() {
    let ctx = context();

    let url = inject_text("https://api.test/{tenant}/items", &ctx);

    assert_eq!(url, "https://api.test/{tenant}/items");
}

#[rstest]
fn referenced_stages_collects_unique_stage_ids() {
    let stage = StageId::new();
    let url = format!(
        "https://api.test?a={{\"@TURNIP_RESPONSES\": {{\"stage\": \"{stage}\"}}}}"
    );
    let data = json!({
        "again": {"@TURNIP_INTERNAL_META": {"stage": stage.to_string()}},
        "local": {"@TURNIP_RESPONSES": {"stage": "in_task"}}
    });

    let stages = referenced_stages(&url, Some(&data));

    assert_eq!(stages, vec![stage]);
}
