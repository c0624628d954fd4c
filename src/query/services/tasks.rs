//! Task-facing operations of the query surface.

use crate::graph::domain::{AssignPolicy, Stage, StageId, TaskStageConfig};
use crate::graph::ports::GraphRepository;
use crate::notification::ports::NotificationRepository;
use crate::pipeline::services::SchemaProjector;
use crate::rank::ports::{RankRepository, UserDirectory};
use crate::rank::services::{LimitAction, LimitGate};
use crate::routing::error::{EngineError, EngineResult};
use crate::routing::services::{CompletionReceipt, CompletionService};
use crate::task::{
    domain::{CaseId, Task, TaskId, UserId},
    ports::TaskRepository,
};
use crate::translation::{ports::TranslationRepository, services::TranslationService};
use crate::fault::ports::FaultRepository;
use crate::webhook::{
    ports::HttpClient,
    services::{WebhookDelivery, WebhookExecutor},
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A task joined with the schemas a client renders it by.
#[derive(Debug, Clone)]
pub struct TaskView {
    /// The task row.
    pub task: Task,
    /// Effective JSON schema: per-task override or stage schema, reshaped
    /// by dynamic rules and translated when a language was requested.
    pub schema: Option<Value>,
    /// Effective UI schema: per-task override or stage UI schema.
    pub ui_schema: Option<Value>,
}

/// Task operations offered to API consumers.
///
/// Every mutation re-reads the task row and persists through the
/// repository; the completion protocol itself is delegated to
/// [`CompletionService`].
#[derive(Clone)]
pub struct TaskGateway<G, T, R, U, N, F, H, TR, C>
where
    G: GraphRepository,
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    N: NotificationRepository,
    F: FaultRepository,
    H: HttpClient,
    TR: TranslationRepository,
    C: Clock + Send + Sync,
{
    graph: Arc<G>,
    tasks: Arc<T>,
    limits: LimitGate<R, T>,
    completion: CompletionService<G, T, R, U, N, F, H, C>,
    webhooks: WebhookExecutor<H, T, F, G, C>,
    projector: SchemaProjector<T>,
    translations: TranslationService<TR, T, C>,
    clock: Arc<C>,
}

impl<G, T, R, U, N, F, H, TR, C> TaskGateway<G, T, R, U, N, F, H, TR, C>
where
    G: GraphRepository,
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    N: NotificationRepository,
    F: FaultRepository,
    H: HttpClient,
    TR: TranslationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a task gateway.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "composition root wiring every collaborator of the surface"
    )]
    pub const fn new(
        graph: Arc<G>,
        tasks: Arc<T>,
        limits: LimitGate<R, T>,
        completion: CompletionService<G, T, R, U, N, F, H, C>,
        webhooks: WebhookExecutor<H, T, F, G, C>,
        projector: SchemaProjector<T>,
        translations: TranslationService<TR, T, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            graph,
            tasks,
            limits,
            completion,
            webhooks,
            projector,
            translations,
            clock,
        }
    }

    /// Creates a task on a creatable stage, opening a fresh case.
    ///
    /// The creator is assigned immediately. When the stage carries
    /// translation adapters, schema titles are harvested and translator
    /// tasks fan out for newly seen titles.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PermissionDenied`] when the stage is not
    /// creatable or outside its availability window, and
    /// [`EngineError::LimitExceeded`] when the creation gate refuses.
    pub async fn create_task(&self, user: UserId, stage_id: StageId) -> EngineResult<Task> {
        let (stage, config) = self.task_stage(stage_id).await?;
        if !config.is_creatable {
            return Err(EngineError::PermissionDenied(format!(
                "stage {stage_id} does not accept direct creation"
            )));
        }
        if !stage.is_available_at(self.clock.utc()) {
            return Err(EngineError::PermissionDenied(format!(
                "stage {stage_id} is outside its availability window"
            )));
        }
        if let Err(refusal) = self
            .limits
            .check(user, stage_id, LimitAction::Creation)
            .await?
        {
            return Err(EngineError::LimitExceeded(refusal));
        }

        let mut task = Task::new(stage_id, CaseId::new(), &*self.clock);
        task.assign(user, &*self.clock)?;
        self.fan_out_translations(&stage, &config, task.case()).await?;
        if let Some(webhook) = &config.webhook
            && webhook.is_triggered
        {
            let delivery = self.webhooks.execute(webhook, &mut task).await?;
            if !delivery.ok {
                tracing::warn!(task = %task.id(), reason = ?delivery.reason, "creation webhook failed");
            }
        }
        self.tasks.store(&task).await?;
        tracing::info!(task = %task.id(), stage = %stage_id, %user, "task created");
        Ok(task)
    }

    /// Returns a task with its effective schemas.
    ///
    /// Anonymous reads are allowed on public stages only; an
    /// authenticated reader must be the assignee unless the task is
    /// unassigned or public.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown tasks and
    /// [`EngineError::PermissionDenied`] for refused reads.
    pub async fn get_task(
        &self,
        actor: Option<UserId>,
        id: TaskId,
        language: Option<&str>,
    ) -> EngineResult<TaskView> {
        let task = self.existing(id).await?;
        let (stage, config) = self.task_stage(task.stage()).await?;
        if !config.is_public {
            let Some(user) = actor else {
                return Err(EngineError::PermissionDenied(
                    "anonymous access is limited to public stages".to_owned(),
                ));
            };
            if task.assignee().is_some_and(|assignee| assignee != user) {
                return Err(EngineError::PermissionDenied(format!(
                    "task {id} belongs to another user"
                )));
            }
        }

        let schema = self
            .effective_schema(
                &stage,
                &config,
                task.schema_override().cloned(),
                Some(task.case()),
                task.assignee(),
                task.responses(),
                language,
            )
            .await?;
        let ui_schema = task
            .ui_schema_override()
            .cloned()
            .or_else(|| config.ui_schema.clone());
        Ok(TaskView {
            task,
            schema,
            ui_schema,
        })
    }

    /// Overlays a partial response map onto an open task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyCompleted`] once the task is
    /// complete and [`EngineError::PermissionDenied`] for non-assignees.
    pub async fn update_responses(
        &self,
        user: UserId,
        id: TaskId,
        patch: Map<String, Value>,
    ) -> EngineResult<Task> {
        let mut task = self.existing(id).await?;
        if task.is_complete() {
            return Err(EngineError::AlreadyCompleted(id));
        }
        if task.assignee() != Some(user) {
            return Err(EngineError::PermissionDenied(format!(
                "task {id} is not assigned to {user}"
            )));
        }
        task.merge_responses(patch, &*self.clock);
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Submits a task for completion under the engine protocol.
    ///
    /// Completed translator tasks additionally persist their entered
    /// translations.
    ///
    /// # Errors
    ///
    /// Propagates every refusal of the completion protocol.
    pub async fn complete_task(
        &self,
        user: Option<UserId>,
        id: TaskId,
        responses: Option<Map<String, Value>>,
    ) -> EngineResult<CompletionReceipt> {
        let receipt = self.completion.complete(id, responses, user).await?;
        if receipt.completed && self.translations.is_translator_task(&receipt.task) {
            let stored = self.translations.store_translations(&receipt.task).await?;
            tracing::debug!(task = %id, stored, "translations recorded");
        }
        Ok(receipt)
    }

    /// Claims an unassigned task for the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LimitExceeded`] when the selection gate
    /// refuses and [`EngineError::PermissionDenied`] when the task is
    /// held by someone else or the stage window is closed.
    pub async fn select_task(&self, user: UserId, id: TaskId) -> EngineResult<Task> {
        let mut task = self.existing(id).await?;
        if task.is_complete() {
            return Err(EngineError::AlreadyCompleted(id));
        }
        if task.assignee().is_some_and(|assignee| assignee != user) {
            return Err(EngineError::PermissionDenied(format!(
                "task {id} is already claimed"
            )));
        }
        let (stage, _) = self.task_stage(task.stage()).await?;
        if !stage.is_available_at(self.clock.utc()) {
            return Err(EngineError::PermissionDenied(format!(
                "stage {} is outside its availability window",
                stage.id()
            )));
        }
        if let Err(refusal) = self
            .limits
            .check(user, task.stage(), LimitAction::Selection)
            .await?
        {
            return Err(EngineError::LimitExceeded(refusal));
        }
        task.assign(user, &*self.clock)?;
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Reopens the latest predecessor of a task on a go-back stage.
    ///
    /// The current task is closed with the forced marker so the case
    /// does not carry two open tasks; re-completing the predecessor
    /// routes forward again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PermissionDenied`] when the stage forbids
    /// going back or the actor is not the assignee, and
    /// [`EngineError::DependencyMissing`] when the task has no
    /// predecessor.
    pub async fn open_previous(&self, user: UserId, id: TaskId) -> EngineResult<Task> {
        let mut task = self.existing(id).await?;
        let (_, config) = self.task_stage(task.stage()).await?;
        if !config.allow_go_back {
            return Err(EngineError::PermissionDenied(format!(
                "stage {} does not allow going back",
                task.stage()
            )));
        }
        if task.assignee() != Some(user) {
            return Err(EngineError::PermissionDenied(format!(
                "task {id} is not assigned to {user}"
            )));
        }
        let Some(previous_id) = task.in_tasks().last().copied() else {
            return Err(EngineError::DependencyMissing(format!(
                "task {id} has no predecessor to reopen"
            )));
        };
        let mut previous = self.existing(previous_id).await?;
        previous.reopen(&*self.clock)?;
        if !task.is_complete() {
            task.complete_forced(&*self.clock)?;
            self.tasks.update(&task).await?;
        }
        self.tasks.update(&previous).await?;
        tracing::info!(task = %id, previous = %previous_id, "predecessor reopened");
        Ok(previous)
    }

    /// Releases a claimed task back to the selection pool.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PermissionDenied`] when the stage forbids
    /// release or the actor is not the assignee.
    pub async fn release_task(&self, user: UserId, id: TaskId) -> EngineResult<Task> {
        let mut task = self.existing(id).await?;
        if task.is_complete() {
            return Err(EngineError::AlreadyCompleted(id));
        }
        let (_, config) = self.task_stage(task.stage()).await?;
        if !config.allow_release {
            return Err(EngineError::PermissionDenied(format!(
                "stage {} does not allow release",
                task.stage()
            )));
        }
        if task.assignee() != Some(user) {
            return Err(EngineError::PermissionDenied(format!(
                "task {id} is not assigned to {user}"
            )));
        }
        task.release(&*self.clock);
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Executes the stage webhook of a task on demand.
    ///
    /// Manual triggering ignores the automatic-fire flag; projections
    /// are applied and the task persisted as on an automatic run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DependencyMissing`] when the stage carries
    /// no webhook.
    pub async fn trigger_webhook(&self, user: UserId, id: TaskId) -> EngineResult<WebhookDelivery> {
        let mut task = self.existing(id).await?;
        if task.assignee().is_some_and(|assignee| assignee != user) {
            return Err(EngineError::PermissionDenied(format!(
                "task {id} belongs to another user"
            )));
        }
        let (_, config) = self.task_stage(task.stage()).await?;
        let Some(webhook) = &config.webhook else {
            return Err(EngineError::DependencyMissing(format!(
                "stage {} carries no webhook",
                task.stage()
            )));
        };
        let delivery = self.webhooks.execute(webhook, &mut task).await?;
        self.tasks.update(&task).await?;
        Ok(delivery)
    }

    /// Lists the unassigned tasks the user may claim.
    ///
    /// Candidate stages are rank-assigned task stages inside their
    /// availability window whose selection gate admits the user.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn list_selectable_tasks(&self, user: UserId) -> EngineResult<Vec<Task>> {
        let now = self.clock.utc();
        let mut candidates = Vec::new();
        for campaign in self.graph.campaigns().await? {
            for chain in self.graph.chains_in_campaign(campaign.id()).await? {
                for stage in self.graph.stages_in_chain(chain.id()).await? {
                    let Some(config) = stage.task_config() else {
                        continue;
                    };
                    if config.assign_user_by != AssignPolicy::Rank
                        || !stage.is_available_at(now)
                    {
                        continue;
                    }
                    if self
                        .limits
                        .check(user, stage.id(), LimitAction::Selection)
                        .await?
                        .is_ok()
                    {
                        candidates.push(stage.id());
                    }
                }
            }
        }
        Ok(self.tasks.unassigned_tasks_at_stages(&candidates).await?)
    }

    /// Returns the stage schema reshaped against in-flight responses.
    ///
    /// Clients pre-fetch this while a form is being filled; `current`
    /// feeds the dynamic rules exactly as a saved draft would.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown stages.
    pub async fn schema_answers(
        &self,
        stage_id: StageId,
        current: &Map<String, Value>,
        current_task: Option<TaskId>,
        language: Option<&str>,
    ) -> EngineResult<Value> {
        let (stage, config) = self.task_stage(stage_id).await?;
        let (base, case, user) = match current_task {
            Some(task_id) => {
                let task = self.existing(task_id).await?;
                (
                    task.schema_override().cloned(),
                    Some(task.case()),
                    task.assignee(),
                )
            }
            None => (None, None, None),
        };
        let schema = self
            .effective_schema(&stage, &config, base, case, user, Some(current), language)
            .await?;
        Ok(schema.unwrap_or(Value::Null))
    }

    async fn existing(&self, id: TaskId) -> EngineResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("task {id}")))
    }

    async fn task_stage(&self, id: StageId) -> EngineResult<(Stage, TaskStageConfig)> {
        let stage = self
            .graph
            .stage(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("stage {id}")))?;
        let Some(config) = stage.task_config().cloned() else {
            return Err(EngineError::NotFound(format!(
                "stage {id} carries no tasks"
            )));
        };
        Ok((stage, config))
    }

    #[expect(
        clippy::too_many_arguments,
        reason = "the projection inputs are independent optional facets"
    )]
    async fn effective_schema(
        &self,
        stage: &Stage,
        config: &TaskStageConfig,
        base: Option<Value>,
        case: Option<CaseId>,
        user: Option<UserId>,
        current: Option<&Map<String, Value>>,
        language: Option<&str>,
    ) -> EngineResult<Option<Value>> {
        let Some(schema) = base.or_else(|| config.json_schema.clone()) else {
            return Ok(None);
        };
        let projected = self
            .projector
            .project(&schema, &config.dynamic_jsons, stage.id(), case, user, current)
            .await?;
        let Some(language) = language else {
            return Ok(Some(projected));
        };
        let Some(campaign) = self.graph.campaign_of_stage(stage.id()).await? else {
            return Ok(Some(projected));
        };
        let rewritten = self
            .translations
            .rewrite_schema(&projected, campaign.id(), language)
            .await?;
        Ok(Some(rewritten))
    }

    /// Harvests schema titles and fans out translator tasks when the
    /// harvest saw new ones.
    async fn fan_out_translations(
        &self,
        stage: &Stage,
        config: &TaskStageConfig,
        case: CaseId,
    ) -> EngineResult<()> {
        if config.translation_adapters.is_empty() {
            return Ok(());
        }
        let Some(schema) = &config.json_schema else {
            return Ok(());
        };
        let Some(campaign) = self.graph.campaign_of_stage(stage.id()).await? else {
            return Ok(());
        };
        let harvested = self
            .translations
            .harvest(campaign.id(), stage.id(), schema)
            .await?;
        if harvested.is_empty() {
            return Ok(());
        }
        for adapter in &config.translation_adapters {
            self.translations
                .spawn_translator_tasks(adapter, campaign.id(), case)
                .await?;
        }
        Ok(())
    }
}
