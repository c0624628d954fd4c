//! Payload building, delivery, and response projection.

use crate::fault::{
    domain::FaultKind,
    ports::FaultRepository,
    services::{FaultRecorder, FaultRecorderError},
};
use crate::graph::ports::GraphRepository;
use crate::task::{
    domain::Task,
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::webhook::domain::{
    InjectionContext, TargetProjection, Webhook, WhichResponses, inject_text, inject_value,
    referenced_stages,
};
use crate::webhook::ports::{HttpClient, HttpRequest};
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for webhook execution.
///
/// Delivery failures are not errors; they come back as a failed
/// [`WebhookDelivery`] after the fault is filed.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
    /// Fault recording failed.
    #[error(transparent)]
    Fault(#[from] FaultRecorderError),
}

/// Result type for webhook execution.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Outcome of one webhook delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    /// Whether the response was merged into the task.
    pub ok: bool,
    /// Failure description when `ok` is false.
    pub reason: Option<String>,
}

impl WebhookDelivery {
    fn success() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Builds, sends, and projects stage-bound webhooks.
///
/// The executor mutates the task in memory; persisting the mutated
/// task stays with the caller, which already owns the surrounding
/// store-or-update decision.
#[derive(Clone)]
pub struct WebhookExecutor<H, T, F, G, C>
where
    H: HttpClient,
    T: TaskRepository,
    F: FaultRepository,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    http: Arc<H>,
    tasks: Arc<T>,
    faults: FaultRecorder<F, G, C>,
    clock: Arc<C>,
}

impl<H, T, F, G, C> WebhookExecutor<H, T, F, G, C>
where
    H: HttpClient,
    T: TaskRepository,
    F: FaultRepository,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    /// Creates a webhook executor.
    #[must_use]
    pub const fn new(
        http: Arc<H>,
        tasks: Arc<T>,
        faults: FaultRecorder<F, G, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            http,
            tasks,
            faults,
            clock,
        }
    }

    /// Executes a webhook for a task.
    ///
    /// On non-2xx status, non-JSON body, or transport failure the fault
    /// is recorded, the task is left untouched, and a failed delivery
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when a repository lookup or the fault
    /// filing itself fails.
    pub async fn execute(
        &self,
        webhook: &Webhook,
        task: &mut Task,
    ) -> WebhookResult<WebhookDelivery> {
        let ctx = self.build_context(webhook, task).await?;
        let body = self.build_payload(webhook, task, &ctx).await?;
        let url = inject_text(&webhook.url, &ctx);
        tracing::debug!(task = %task.id(), %url, "dispatching webhook");
        let request = HttpRequest {
            method: webhook.method,
            url: url.clone(),
            headers: webhook.headers.clone(),
            body,
        };

        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(err) => {
                let reason = format!("webhook transport failed for {url}: {err}");
                self.file_failure(task, &reason, None).await?;
                return Ok(WebhookDelivery::failure(reason));
            }
        };
        if !response.is_success() {
            let reason = format!("webhook {url} returned status {}", response.status);
            self.file_failure(task, &reason, Some(json!({"status": response.status, "body": response.body})))
                .await?;
            return Ok(WebhookDelivery::failure(reason));
        }
        let Some(parsed) = response.json() else {
            let reason = format!("webhook {url} returned a non-JSON body");
            self.file_failure(task, &reason, Some(Value::String(response.body)))
                .await?;
            return Ok(WebhookDelivery::failure(reason));
        };

        self.apply_targets(webhook, task, &parsed);
        Ok(WebhookDelivery::success())
    }

    async fn file_failure(
        &self,
        task: &Task,
        reason: &str,
        payload: Option<Value>,
    ) -> WebhookResult<()> {
        self.faults
            .record(FaultKind::WebhookFailure, reason, Some(task.id()), payload)
            .await?;
        Ok(())
    }

    async fn build_payload(
        &self,
        webhook: &Webhook,
        task: &Task,
        ctx: &InjectionContext,
    ) -> WebhookResult<Option<Value>> {
        let payload = match webhook.which_responses {
            WhichResponses::InResponses => {
                let mut rows = Vec::new();
                for id in task.in_tasks() {
                    if let Some(predecessor) = self.tasks.find_by_id(*id).await? {
                        rows.push(Value::Object(predecessor.responses_or_empty()));
                    }
                }
                Some(Value::Array(rows))
            }
            WhichResponses::CurrentTaskResponses => Some(Value::Object(task.responses_or_empty())),
            WhichResponses::ModifierField => {
                webhook.data.as_ref().map(|template| inject_value(template, ctx))
            }
        };
        Ok(payload)
    }

    async fn build_context(
        &self,
        webhook: &Webhook,
        task: &Task,
    ) -> WebhookResult<InjectionContext> {
        let mut ctx = InjectionContext {
            user: task.assignee(),
            responses: task.responses_or_empty(),
            internal_metadata: task.internal_metadata().cloned().unwrap_or_default(),
            ..InjectionContext::new()
        };
        if let Some(latest) = task.in_tasks().last()
            && let Some(predecessor) = self.tasks.find_by_id(*latest).await?
        {
            ctx.in_task_responses = predecessor.responses_or_empty();
            ctx.in_task_metadata = predecessor.internal_metadata().cloned().unwrap_or_default();
        }
        for stage in referenced_stages(&webhook.url, webhook.data.as_ref()) {
            let rows = self.tasks.tasks_by_case_and_stage(task.case(), stage).await?;
            if let Some(source) = rows.iter().rev().find(|candidate| candidate.is_complete()) {
                ctx.stage_responses.insert(stage, source.responses_or_empty());
                ctx.stage_metadata.insert(
                    stage,
                    source.internal_metadata().cloned().unwrap_or_default(),
                );
            }
        }
        Ok(ctx)
    }

    fn apply_targets(&self, webhook: &Webhook, task: &mut Task, body: &Value) {
        if let Some(projection) = &webhook.target_responses
            && let Some(patch) = projected_map(projection, body)
        {
            task.merge_responses(patch, &*self.clock);
        }
        if let Some(projection) = &webhook.target_internal_metadata
            && let Some(patch) = projected_map(projection, body)
        {
            task.merge_internal_metadata(patch, &*self.clock);
        }
        if let Some(projection) = &webhook.target_schema {
            task.set_schema_override(projected_value(projection, body), &*self.clock);
        }
        if let Some(projection) = &webhook.target_ui_schema {
            task.set_ui_schema_override(projected_value(projection, body), &*self.clock);
        }
    }
}

/// Extracts a projection target as a merge patch.
///
/// A non-object result needs a field name to wrap under; a whole-body
/// projection of a non-object has none and is dropped with a warning.
fn projected_map(projection: &TargetProjection, body: &Value) -> Option<Map<String, Value>> {
    match projected_value(projection, body) {
        Value::Object(map) => Some(map),
        other => match &projection.field {
            Some(field) => {
                let mut wrapped = Map::new();
                wrapped.insert(field.clone(), other);
                Some(wrapped)
            }
            None => {
                tracing::warn!("webhook body is not an object; projection target skipped");
                None
            }
        },
    }
}

fn projected_value(projection: &TargetProjection, body: &Value) -> Value {
    match &projection.field {
        None => body.clone(),
        Some(field) => body.get(field).cloned().unwrap_or(Value::Null),
    }
}
