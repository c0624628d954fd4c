//! Marker injection for webhook URL and body templates.
//!
//! Templates may carry bare markers (`@TURNIP_USER_ID`,
//! `@TURNIP_RESPONSES`, `@TURNIP_INTERNAL_META`) or parameterised
//! object literals such as
//! `{"@TURNIP_RESPONSES": {"stage": "<id>", "field": "name"}}`.
//! The scanner walks templates without regular expressions: it finds
//! each balanced `{…}` whose first key starts with `@TURNIP_`, parses
//! it as JSON, and resolves it against the injection context. A marker
//! embedded inside a larger string splices in as text; a marker that is
//! the whole template value substitutes as raw JSON.

use crate::graph::domain::StageId;
use crate::task::domain::UserId;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

const MARKER_PREFIX: &str = "@TURNIP_";
const USER_ID: &str = "@TURNIP_USER_ID";
const RESPONSES: &str = "@TURNIP_RESPONSES";
const INTERNAL_META: &str = "@TURNIP_INTERNAL_META";
const IN_TASK_REF: &str = "in_task";

/// Task data the markers resolve against.
///
/// `stage_responses` and `stage_metadata` hold the latest completed
/// task maps of every stage the templates reference; callers prefetch
/// them via [`referenced_stages`].
#[derive(Debug, Clone, Default)]
pub struct InjectionContext {
    /// Assignee of the task the webhook fires for.
    pub user: Option<UserId>,
    /// The task's own responses.
    pub responses: Map<String, Value>,
    /// The task's internal metadata.
    pub internal_metadata: Map<String, Value>,
    /// Responses of the latest predecessor task.
    pub in_task_responses: Map<String, Value>,
    /// Internal metadata of the latest predecessor task.
    pub in_task_metadata: Map<String, Value>,
    /// Latest completed responses per referenced stage.
    pub stage_responses: BTreeMap<StageId, Map<String, Value>>,
    /// Latest completed internal metadata per referenced stage.
    pub stage_metadata: BTreeMap<StageId, Map<String, Value>>,
}

impl InjectionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Injects markers into a text template, splicing values as text.
#[must_use]
pub fn inject_text(template: &str, ctx: &InjectionContext) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some((start, end, map)) = next_marker_object(rest) {
        out.push_str(&replace_bare(rest.get(..start).unwrap_or_default(), ctx));
        push_inline(&mut out, &resolve_object(&map, ctx));
        rest = rest.get(end..).unwrap_or_default();
    }
    out.push_str(&replace_bare(rest, ctx));
    out
}

/// Injects markers into a JSON template.
///
/// Strings that consist of exactly one marker, and objects whose first
/// key is a marker, are replaced by the resolved JSON value; markers
/// inside longer strings splice in as text.
#[must_use]
pub fn inject_value(template: &Value, ctx: &InjectionContext) -> Value {
    match template {
        Value::String(text) => inject_string(text, ctx),
        Value::Array(items) => Value::Array(items.iter().map(|item| inject_value(item, ctx)).collect()),
        Value::Object(map) => {
            if is_marker_object(map) {
                resolve_object(map, ctx)
            } else {
                Value::Object(
                    map.iter()
                        .map(|(key, value)| (key.clone(), inject_value(value, ctx)))
                        .collect(),
                )
            }
        }
        other => other.clone(),
    }
}

/// Collects the stages the templates reference, without duplicates.
#[must_use]
pub fn referenced_stages(url: &str, data: Option<&Value>) -> Vec<StageId> {
    let mut stages = Vec::new();
    stages_in_text(url, &mut stages);
    if let Some(template) = data {
        stages_in_value(template, &mut stages);
    }
    stages
}

fn inject_string(text: &str, ctx: &InjectionContext) -> Value {
    let trimmed = text.trim();
    if let Some(resolved) = resolve_bare(trimmed, ctx) {
        return resolved;
    }
    if let Some((start, end, map)) = next_marker_object(trimmed)
        && start == 0
        && end == trimmed.len()
    {
        return resolve_object(&map, ctx);
    }
    Value::String(inject_text(text, ctx))
}

fn replace_bare(text: &str, ctx: &InjectionContext) -> String {
    let mut out = text.to_owned();
    for marker in [USER_ID, RESPONSES, INTERNAL_META] {
        if out.contains(marker)
            && let Some(resolved) = resolve_bare(marker, ctx)
        {
            let mut inline = String::new();
            push_inline(&mut inline, &resolved);
            out = out.replace(marker, &inline);
        }
    }
    out
}

fn push_inline(out: &mut String, value: &Value) {
    match value {
        Value::String(text) => out.push_str(text),
        other => out.push_str(&other.to_string()),
    }
}

fn resolve_bare(marker: &str, ctx: &InjectionContext) -> Option<Value> {
    match marker {
        USER_ID => Some(
            ctx.user
                .map_or(Value::Null, |user| Value::String(user.to_string())),
        ),
        RESPONSES => Some(Value::Object(ctx.responses.clone())),
        INTERNAL_META => Some(Value::Object(ctx.internal_metadata.clone())),
        _ => None,
    }
}

/// Resolves a parsed marker object. Unknown markers and unresolvable
/// stage references resolve to `null` rather than failing delivery.
fn resolve_object(map: &Map<String, Value>, ctx: &InjectionContext) -> Value {
    let Some((key, params)) = map.iter().next() else {
        return Value::Null;
    };
    if key == USER_ID {
        return ctx
            .user
            .map_or(Value::Null, |user| Value::String(user.to_string()));
    }
    let source = match key.as_str() {
        RESPONSES => SourceMap::Responses,
        INTERNAL_META => SourceMap::InternalMeta,
        _ => return Value::Null,
    };
    let Some(base) = source_map(source, params.as_object(), ctx) else {
        return Value::Null;
    };
    match params
        .as_object()
        .and_then(|object| object.get("field"))
        .and_then(Value::as_str)
    {
        Some(field) => base.get(field).cloned().unwrap_or(Value::Null),
        None => Value::Object(base.clone()),
    }
}

#[derive(Clone, Copy)]
enum SourceMap {
    Responses,
    InternalMeta,
}

fn source_map<'a>(
    source: SourceMap,
    params: Option<&Map<String, Value>>,
    ctx: &'a InjectionContext,
) -> Option<&'a Map<String, Value>> {
    let stage_ref = params.and_then(|object| object.get("stage"));
    match stage_ref {
        None => Some(match source {
            SourceMap::Responses => &ctx.responses,
            SourceMap::InternalMeta => &ctx.internal_metadata,
        }),
        Some(Value::String(name)) if name == IN_TASK_REF => Some(match source {
            SourceMap::Responses => &ctx.in_task_responses,
            SourceMap::InternalMeta => &ctx.in_task_metadata,
        }),
        Some(Value::String(name)) => {
            let stage = parse_stage(name)?;
            match source {
                SourceMap::Responses => ctx.stage_responses.get(&stage),
                SourceMap::InternalMeta => ctx.stage_metadata.get(&stage),
            }
        }
        Some(_) => None,
    }
}

fn parse_stage(name: &str) -> Option<StageId> {
    Uuid::parse_str(name).ok().map(StageId::from_uuid)
}

/// Finds the next balanced object literal whose first key is a marker.
///
/// Returns the byte range of the literal and its parsed map.
fn next_marker_object(text: &str) -> Option<(usize, usize, Map<String, Value>)> {
    let mut search = 0_usize;
    while let Some(offset) = text.get(search..)?.find('{') {
        let start = search + offset;
        if let Some(end) = balanced_object_end(text, start)
            && let Some(candidate) = text.get(start..end)
            && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate)
            && is_marker_object(&map)
        {
            return Some((start, end, map));
        }
        search = start + 1;
    }
    None
}

/// Returns the exclusive end of the balanced `{…}` opening at `start`,
/// honouring braces inside JSON string literals.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let tail = text.get(start..)?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn is_marker_object(map: &Map<String, Value>) -> bool {
    map.keys().next().is_some_and(|key| key.starts_with(MARKER_PREFIX))
}

fn stages_in_text(text: &str, out: &mut Vec<StageId>) {
    let mut rest = text;
    while let Some((_, end, map)) = next_marker_object(rest) {
        if let Some(stage) = stage_param(&map)
            && !out.contains(&stage)
        {
            out.push(stage);
        }
        rest = rest.get(end..).unwrap_or_default();
    }
}

fn stages_in_value(value: &Value, out: &mut Vec<StageId>) {
    match value {
        Value::String(text) => stages_in_text(text, out),
        Value::Array(items) => {
            for item in items {
                stages_in_value(item, out);
            }
        }
        Value::Object(map) => {
            if is_marker_object(map) {
                if let Some(stage) = stage_param(map)
                    && !out.contains(&stage)
                {
                    out.push(stage);
                }
            } else {
                for nested in map.values() {
                    stages_in_value(nested, out);
                }
            }
        }
        _ => {}
    }
}

fn stage_param(map: &Map<String, Value>) -> Option<StageId> {
    let params = map.values().next()?.as_object()?;
    let name = params.get("stage")?.as_str()?;
    if name == IN_TASK_REF {
        return None;
    }
    parse_stage(name)
}
