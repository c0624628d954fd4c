//! Stage-bound webhook descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// HTTP method the webhook is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpMethod {
    /// `POST` request.
    #[default]
    Post,
    /// `PATCH` request.
    Patch,
    /// `PUT` request.
    Put,
}

/// Which task data forms the outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhichResponses {
    /// The response maps of the task's predecessors, as a JSON array.
    #[default]
    InResponses,
    /// The task's own response map.
    CurrentTaskResponses,
    /// The injected `data` template.
    ModifierField,
}

/// One enabled response-projection target.
///
/// Without a field the whole response body is merged; with one, only
/// `body[field]` is taken and non-object results are wrapped as
/// `{field: value}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetProjection {
    /// Response-body field to extract; `None` takes the whole body.
    pub field: Option<String>,
}

impl TargetProjection {
    /// Projects the whole response body.
    #[must_use]
    pub const fn whole_body() -> Self {
        Self { field: None }
    }

    /// Projects one field of the response body.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
        }
    }
}

/// Outbound webhook bound to a task stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    /// HTTP method.
    pub method: HttpMethod,
    /// URL template; `@TURNIP_` markers are injected before sending.
    pub url: String,
    /// Headers sent verbatim with every request.
    pub headers: BTreeMap<String, String>,
    /// Body template for [`WhichResponses::ModifierField`].
    pub data: Option<Value>,
    /// Payload source selector.
    pub which_responses: WhichResponses,
    /// Merge the response into the task's responses.
    pub target_responses: Option<TargetProjection>,
    /// Merge the response into the stage schema override.
    pub target_schema: Option<TargetProjection>,
    /// Merge the response into the UI schema override.
    pub target_ui_schema: Option<TargetProjection>,
    /// Merge the response into the task's internal metadata.
    pub target_internal_metadata: Option<TargetProjection>,
    /// Fire automatically on task creation and completion.
    pub is_triggered: bool,
}

impl Webhook {
    /// Creates a webhook posting predecessor responses to a URL, with
    /// no projection targets.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: BTreeMap::new(),
            data: None,
            which_responses: WhichResponses::InResponses,
            target_responses: None,
            target_schema: None,
            target_ui_schema: None,
            target_internal_metadata: None,
            is_triggered: false,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body template and switches the payload source to it.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self.which_responses = WhichResponses::ModifierField;
        self
    }

    /// Sets the payload source.
    #[must_use]
    pub const fn with_which_responses(mut self, which: WhichResponses) -> Self {
        self.which_responses = which;
        self
    }

    /// Enables projection into the task's responses.
    #[must_use]
    pub fn with_responses_target(mut self, projection: TargetProjection) -> Self {
        self.target_responses = Some(projection);
        self
    }

    /// Enables projection into the schema override.
    #[must_use]
    pub fn with_schema_target(mut self, projection: TargetProjection) -> Self {
        self.target_schema = Some(projection);
        self
    }

    /// Enables projection into the UI-schema override.
    #[must_use]
    pub fn with_ui_schema_target(mut self, projection: TargetProjection) -> Self {
        self.target_ui_schema = Some(projection);
        self
    }

    /// Enables projection into the task's internal metadata.
    #[must_use]
    pub fn with_internal_metadata_target(mut self, projection: TargetProjection) -> Self {
        self.target_internal_metadata = Some(projection);
        self
    }

    /// Fires the webhook automatically on creation and completion.
    #[must_use]
    pub const fn triggered(mut self) -> Self {
        self.is_triggered = true;
        self
    }
}
