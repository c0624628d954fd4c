//! One-hop routing of completed tasks through the stage graph.
//!
//! Routing walks the outgoing edges of the completed task's stage,
//! evaluating conditionals and spawning successor tasks. Cycles through
//! auto-completed stages are bounded by a hop cap; hitting the cap files
//! a fault instead of recursing further.

use crate::fault::{domain::FaultKind, ports::FaultRepository, services::FaultRecorder};
use crate::graph::domain::{Stage, StageId, StageKind, TaskStageConfig, evaluate_all};
use crate::graph::ports::GraphRepository;
use crate::notification::domain::{Direction, NotificationId};
use crate::notification::ports::NotificationRepository;
use crate::notification::services::NotificationDispatch;
use crate::pipeline::domain::Quiz;
use crate::pipeline::services::FieldCopier;
use crate::rank::ports::{RankRepository, UserDirectory};
use crate::routing::error::{EngineError, EngineResult};
use crate::routing::services::{AssignmentEngine, AssignmentOutcome};
use crate::task::{
    domain::{CaseId, Task, TaskId},
    ports::TaskRepository,
};
use crate::webhook::ports::HttpClient;
use crate::webhook::services::WebhookExecutor;
use mockable::Clock;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Hop cap for one completion's routing pass.
const MAX_HOPS: u32 = 64;

/// Internal-metadata key holding an exposed quiz answer key.
const QUIZ_ANSWERS_META: &str = "quiz_answers";

/// What one routing pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingReport {
    /// Tasks created at successor stages, in traversal order.
    pub created: Vec<TaskId>,
    /// Created tasks that received an assignee.
    pub assigned: Vec<TaskId>,
    /// Tasks completed by the auto-complete policy.
    pub auto_completed: Vec<TaskId>,
    /// Predecessor returned by a ping-pong conditional.
    pub reopened: Option<TaskId>,
    /// Notifications cloned on routing transitions.
    pub notifications: Vec<NotificationId>,
}

/// Routes a just-completed task one hop through the graph.
#[derive(Clone)]
pub struct Router<G, T, R, U, N, F, H, C>
where
    G: GraphRepository,
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    N: NotificationRepository,
    F: FaultRepository,
    H: HttpClient,
    C: Clock + Send + Sync,
{
    graph: Arc<G>,
    tasks: Arc<T>,
    assignment: AssignmentEngine<T, R, U, G, C>,
    copier: FieldCopier<T>,
    webhooks: WebhookExecutor<H, T, F, G, C>,
    notifications: NotificationDispatch<N, C>,
    faults: FaultRecorder<F, G, C>,
    clock: Arc<C>,
}

impl<G, T, R, U, N, F, H, C> Router<G, T, R, U, N, F, H, C>
where
    G: GraphRepository,
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    N: NotificationRepository,
    F: FaultRepository,
    H: HttpClient,
    C: Clock + Send + Sync,
{
    /// Creates a router over the composed services.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "the router is the composition root of the routing side effects"
    )]
    pub const fn new(
        graph: Arc<G>,
        tasks: Arc<T>,
        assignment: AssignmentEngine<T, R, U, G, C>,
        copier: FieldCopier<T>,
        webhooks: WebhookExecutor<H, T, F, G, C>,
        notifications: NotificationDispatch<N, C>,
        faults: FaultRecorder<F, G, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            graph,
            tasks,
            assignment,
            copier,
            webhooks,
            notifications,
            faults,
            clock,
        }
    }

    /// Routes one completed task.
    ///
    /// A ping-pong conditional guarding the completed stage is checked
    /// first; when its predicate holds the predecessor is returned and
    /// no forward traversal happens. Otherwise successors are spawned
    /// along the outgoing edges, a campaign linker on the completed
    /// stage opens the cross-campaign join, and a LAST_ONE notification
    /// fires when the pass produced no new user-assigned task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when a repository lookup or a successor
    /// mutation fails, and [`EngineError::Assignment`] when a successor's
    /// assignment policy cannot resolve a user; the caller decides
    /// whether to roll the triggering completion back.
    pub async fn route(&self, completed: &Task) -> EngineResult<RoutingReport> {
        let mut report = RoutingReport::default();
        if self.pingpong_return(completed, &mut report).await? {
            return Ok(report);
        }
        self.hop(completed, completed.stage(), 0, &mut report).await?;
        self.link_campaign(completed, &mut report).await?;
        if report.reopened.is_none() && report.assigned.is_empty() {
            let fired = self
                .notifications
                .fire(completed.stage(), Direction::LastOne, completed)
                .await?;
            report.notifications.extend(fired);
        }
        Ok(report)
    }

    /// Evaluates ping-pong conditionals guarding the completed stage.
    ///
    /// When the predicate of an inbound ping-pong conditional holds
    /// against the completed responses, the task's latest predecessor is
    /// reopened with its responses kept and a BACKWARD notification
    /// fires. Returns whether a return happened.
    async fn pingpong_return(
        &self,
        completed: &Task,
        report: &mut RoutingReport,
    ) -> EngineResult<bool> {
        let responses = completed.responses_or_empty();
        for stage in self.graph.in_stages(completed.stage()).await? {
            let Some(config) = stage.conditional_config() else {
                continue;
            };
            if !config.pingpong || !evaluate_all(&config.conditions, &responses) {
                continue;
            }
            let Some(predecessor) = completed.in_tasks().last().copied() else {
                self.faults
                    .record(
                        FaultKind::DependencyMissing,
                        &format!("ping-pong return from task {} has no predecessor", completed.id()),
                        Some(completed.id()),
                        None,
                    )
                    .await?;
                return Ok(false);
            };
            let Some(mut target) = self.tasks.find_by_id(predecessor).await? else {
                return Err(EngineError::NotFound(format!("task {predecessor}")));
            };
            target.reopen(&*self.clock)?;
            self.tasks.update(&target).await?;
            tracing::debug!(task = %target.id(), conditional = %stage.id(), "ping-pong return");
            report.reopened = Some(target.id());
            let fired = self
                .notifications
                .fire(stage.id(), Direction::Backward, &target)
                .await?;
            report.notifications.extend(fired);
            return Ok(true);
        }
        Ok(false)
    }

    /// Expands the outgoing edges of one stage for a trigger task.
    fn hop<'a>(
        &'a self,
        trigger: &'a Task,
        from: StageId,
        depth: u32,
        report: &'a mut RoutingReport,
    ) -> Pin<Box<dyn Future<Output = EngineResult<()>> + Send + 'a>> {
        Box::pin(async move {
            if depth >= MAX_HOPS {
                self.faults
                    .record(
                        FaultKind::RoutingDepthExceeded,
                        &format!("routing exceeded {MAX_HOPS} hops at stage {from}"),
                        Some(trigger.id()),
                        None,
                    )
                    .await?;
                return Ok(());
            }
            let successors = self.graph.out_stages(from).await?;
            let responses = trigger.responses_or_empty();
            let elected = elect_conditional(&successors, &responses);
            for stage in &successors {
                match stage.kind() {
                    StageKind::Conditional(config) => {
                        if let Some(winner) = elected
                            && stage.id() != winner
                        {
                            continue;
                        }
                        if config.pingpong {
                            // Holds: handled as a return on the successor's
                            // own completion. Fails: forward as normal.
                            if !evaluate_all(&config.conditions, &responses) {
                                self.hop(trigger, stage.id(), depth + 1, report).await?;
                            }
                        } else if evaluate_all(&config.conditions, &responses) {
                            self.hop(trigger, stage.id(), depth + 1, report).await?;
                        }
                    }
                    StageKind::Task(config) => {
                        self.spawn(stage, config, trigger, depth, report).await?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Creates (or joins) the successor task at one task stage.
    async fn spawn(
        &self,
        stage: &Stage,
        config: &TaskStageConfig,
        trigger: &Task,
        depth: u32,
        report: &mut RoutingReport,
    ) -> EngineResult<()> {
        let (mut task, persisted) = if let Some(integration) = &config.integration {
            let group = integration.group_key(&trigger.responses_or_empty());
            let candidate =
                Task::new_integrator(stage.id(), trigger.case(), group, &*self.clock)
                    .with_in_task(trigger.id());
            let (integrator, created) = self.tasks.get_or_create_integrator(candidate).await?;
            if !created {
                tracing::debug!(
                    task = %integrator.id(),
                    predecessor = %trigger.id(),
                    "predecessor joined existing integrator"
                );
                return Ok(());
            }
            (integrator, true)
        } else {
            let fresh =
                Task::new(stage.id(), trigger.case(), &*self.clock).with_in_task(trigger.id());
            (fresh, false)
        };

        let overlay = self
            .copier
            .overlay(&config.copy_fields, task.case(), trigger.assignee())
            .await?;
        if !overlay.is_empty() {
            task.merge_responses(overlay, &*self.clock);
        }
        if config.copy_input {
            task.merge_responses(trigger.responses_or_empty(), &*self.clock);
        }
        if let Some(quiz) = &config.quiz
            && quiz.send_answers_with_questions
        {
            self.expose_answer_key(quiz, &mut task).await?;
        }
        if let Some(webhook) = &config.webhook
            && webhook.is_triggered
        {
            let delivery = self.webhooks.execute(webhook, &mut task).await?;
            if !delivery.ok {
                tracing::warn!(task = %task.id(), "creation webhook failed; task continues unmodified");
            }
        }

        // An unresolvable assignment rejects the whole routing pass; the
        // fresh successor was never stored, so nothing is left behind.
        let outcome = self.assignment.assign(config, &mut task, Some(trigger)).await?;
        if persisted {
            self.tasks.update(&task).await?;
        } else {
            self.tasks.store(&task).await?;
        }
        report.created.push(task.id());
        if matches!(outcome, AssignmentOutcome::Assigned(_)) {
            report.assigned.push(task.id());
        }

        let fired = self
            .notifications
            .fire(trigger.stage(), Direction::Forward, &task)
            .await?;
        report.notifications.extend(fired);

        if matches!(outcome, AssignmentOutcome::AutoComplete) {
            task.complete_forced(&*self.clock)?;
            self.tasks.update(&task).await?;
            report.auto_completed.push(task.id());
            self.hop(&task, task.stage(), depth + 1, report).await?;
        }
        Ok(())
    }

    /// Opens the cross-campaign join configured on the completed stage.
    ///
    /// The joined task starts a fresh case at the linked stage, carries
    /// the trigger as a predecessor, and stays with the completing user
    /// so their work continues in the linked campaign.
    async fn link_campaign(
        &self,
        trigger: &Task,
        report: &mut RoutingReport,
    ) -> EngineResult<()> {
        let Some(stage) = self.graph.stage(trigger.stage()).await? else {
            return Ok(());
        };
        let Some(linker) = stage
            .task_config()
            .and_then(|config| config.campaign_linker.as_ref())
        else {
            return Ok(());
        };
        let mut joined = Task::new(linker.target_stage, CaseId::new(), &*self.clock)
            .with_in_task(trigger.id());
        if linker.copy_input {
            joined.merge_responses(trigger.responses_or_empty(), &*self.clock);
        }
        if let Some(user) = trigger.assignee() {
            joined.assign(user, &*self.clock)?;
            report.assigned.push(joined.id());
        }
        self.tasks.store(&joined).await?;
        report.created.push(joined.id());
        tracing::debug!(
            task = %joined.id(),
            stage = %linker.target_stage,
            "cross-campaign join opened"
        );
        Ok(())
    }

    /// Copies the latest answer key into the task's internal metadata
    /// (quiz practice mode).
    async fn expose_answer_key(&self, quiz: &Quiz, task: &mut Task) -> EngineResult<()> {
        let rows = self
            .tasks
            .completed_responses_for_case(task.case(), quiz.answer_stage)
            .await?;
        if let Some(answers) = rows.last() {
            let mut meta = Map::new();
            meta.insert(QUIZ_ANSWERS_META.to_owned(), Value::Object(answers.clone()));
            task.merge_internal_metadata(meta, &*self.clock);
        }
        Ok(())
    }
}

/// Elects the single passing conditional among competing siblings.
///
/// Participation is opted into by setting `conditional_limit_order` on
/// at least one sibling; the passing conditional with the smallest order
/// wins, tie-broken by edge insertion order. Returns `None` when no
/// sibling opted in.
fn elect_conditional(successors: &[Stage], responses: &Map<String, Value>) -> Option<StageId> {
    let conditionals: Vec<_> = successors
        .iter()
        .filter_map(|stage| stage.conditional_config().map(|config| (stage, config)))
        .collect();
    if !conditionals
        .iter()
        .any(|(_, config)| config.conditional_limit_order.is_some())
    {
        return None;
    }
    conditionals
        .iter()
        .filter(|(_, config)| evaluate_all(&config.conditions, responses))
        .min_by_key(|(_, config)| config.conditional_limit_order.unwrap_or(u32::MAX))
        .map(|(stage, _)| stage.id())
}
