//! The completion transaction: lock, validate, commit, side effects.
//!
//! Completion is the only racing mutation. The row lock is held across
//! validation and the state write; routing, webhooks, and awards run
//! after the commit and their failures are filed as faults rather than
//! rolled back. The one exception is an unresolvable successor
//! assignment, which rejects the completion and reopens the task.

use crate::fault::{domain::FaultKind, ports::FaultRepository, services::FaultRecorder};
use crate::graph::ports::GraphRepository;
use crate::notification::ports::NotificationRepository;
use crate::pipeline::domain::{Quiz, QuizOutcome};
use crate::rank::ports::{RankRepository, UserDirectory};
use crate::rank::services::{AwardService, LimitAction, LimitGate};
use crate::routing::error::{EngineError, EngineResult};
use crate::routing::services::{Router, RoutingReport, validate_responses};
use crate::task::{
    domain::{Task, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::webhook::ports::HttpClient;
use crate::webhook::services::{WebhookDelivery, WebhookExecutor};
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Response key carrying the graded score.
const SCORE_META: &str = "meta_quiz_score";
/// Response key listing the incorrectly answered questions.
const INCORRECT_META: &str = "meta_quiz_incorrect_questions";

/// How a committed completion resolved for the submitting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The task was saved with no direct follow-up for the user.
    Saved,
    /// Routing assigned exactly one successor to the same user.
    NextDirect {
        /// The successor the user can continue with.
        task: TaskId,
        /// Whether the successor sits in a different campaign.
        is_new_campaign: bool,
    },
}

/// What a completion call did.
#[derive(Debug)]
pub struct CompletionReceipt {
    /// The task as persisted by this call.
    pub task: Task,
    /// Grading outcome when the stage carries a quiz.
    pub quiz: Option<QuizOutcome>,
    /// Delivery outcome of the stage webhook, when one fired.
    pub webhook: Option<WebhookDelivery>,
    /// Routing side effects of the committed completion.
    pub routing: RoutingReport,
    /// False when a quiz score below the threshold withheld completion.
    pub completed: bool,
    /// Direct follow-up resolution for the submitting user.
    pub outcome: CompletionOutcome,
}

/// Drives the completion transaction for one task.
#[derive(Clone)]
pub struct CompletionService<G, T, R, U, N, F, H, C>
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
    limits: LimitGate<R, T>,
    awards: AwardService<R, T, N, C>,
    router: Router<G, T, R, U, N, F, H, C>,
    webhooks: WebhookExecutor<H, T, F, G, C>,
    faults: FaultRecorder<F, G, C>,
    clock: Arc<C>,
}

impl<G, T, R, U, N, F, H, C> CompletionService<G, T, R, U, N, F, H, C>
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
    /// Creates a completion service over the composed side effects.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "the completion service is the composition root of the engine"
    )]
    pub const fn new(
        graph: Arc<G>,
        tasks: Arc<T>,
        limits: LimitGate<R, T>,
        awards: AwardService<R, T, N, C>,
        router: Router<G, T, R, U, N, F, H, C>,
        webhooks: WebhookExecutor<H, T, F, G, C>,
        faults: FaultRecorder<F, G, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            graph,
            tasks,
            limits,
            awards,
            router,
            webhooks,
            faults,
            clock,
        }
    }

    /// Completes a task with an optional final response patch.
    ///
    /// The row lock is taken first; the `complete` flag is re-checked on
    /// the locked snapshot so a concurrent submission surfaces as
    /// [`EngineError::AlreadyCompleted`] rather than a double write.
    /// Validation, the submission limit gate, and quiz grading happen
    /// under the lock. Side effects run after the commit; their failures
    /// file faults and never undo the completion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CompletionConflict`] when another call
    /// holds the lock, [`EngineError::AlreadyCompleted`] on a repeated
    /// submission, [`EngineError::ValidationFailure`] on schema
    /// violations, [`EngineError::PermissionDenied`] when the actor is
    /// not the assignee, and [`EngineError::LimitExceeded`] when the
    /// submission gate refuses. [`EngineError::Assignment`] rolls the
    /// commit back: the task is reopened and stays with its user.
    pub async fn complete(
        &self,
        id: TaskId,
        patch: Option<Map<String, Value>>,
        actor: Option<UserId>,
    ) -> EngineResult<CompletionReceipt> {
        let guard = match self.tasks.lock_for_completion(id).await {
            Ok(guard) => guard,
            Err(TaskRepositoryError::LockContended(contended)) => {
                return Err(EngineError::CompletionConflict(contended));
            }
            Err(TaskRepositoryError::NotFound(missing)) => {
                return Err(EngineError::NotFound(format!("task {missing}")));
            }
            Err(other) => return Err(other.into()),
        };
        let mut task = guard.task().clone();
        if task.is_complete() {
            return Err(EngineError::AlreadyCompleted(id));
        }
        if let Some(user) = actor {
            if task.assignee().is_some_and(|assignee| assignee != user) {
                return Err(EngineError::PermissionDenied(format!(
                    "task {id} belongs to another user"
                )));
            }
            task.assign(user, &*self.clock)?;
        }

        let Some(stage) = self.graph.stage(task.stage()).await? else {
            return Err(EngineError::NotFound(format!("stage {}", task.stage())));
        };
        let Some(config) = stage.task_config().cloned() else {
            return Err(EngineError::DependencyMissing(format!(
                "task {id} sits on a conditional stage"
            )));
        };

        if let Some(responses) = patch {
            task.merge_responses(responses, &*self.clock);
        }
        let schema = task
            .schema_override()
            .cloned()
            .or_else(|| config.json_schema.clone());
        if let Some(schema) = &schema {
            validate_responses(schema, &task.responses_or_empty())?;
        }
        if let Some(user) = task.assignee()
            && let Err(refusal) = self
                .limits
                .check(user, task.stage(), LimitAction::Submission)
                .await?
        {
            return Err(EngineError::LimitExceeded(refusal));
        }

        let quiz_outcome = match &config.quiz {
            Some(quiz) => self.grade(quiz, &mut task).await?,
            None => None,
        };
        if let Some(outcome) = &quiz_outcome
            && !outcome.passed
        {
            // Withheld: the attempt and its feedback persist, the task
            // stays open for another submission.
            self.tasks.update(&task).await?;
            drop(guard);
            return Ok(CompletionReceipt {
                task,
                quiz: quiz_outcome,
                webhook: None,
                routing: RoutingReport::default(),
                completed: false,
                outcome: CompletionOutcome::Saved,
            });
        }

        task.complete(&*self.clock)?;
        self.tasks.update(&task).await?;
        drop(guard);

        let mut webhook_delivery = None;
        if let Some(webhook) = &config.webhook
            && webhook.is_triggered
        {
            match self.webhooks.execute(webhook, &mut task).await {
                Ok(delivery) => {
                    if delivery.ok {
                        self.tasks.update(&task).await?;
                    }
                    webhook_delivery = Some(delivery);
                }
                Err(err) => {
                    self.file_side_effect_fault(&task, "completion webhook", &err.to_string())
                        .await?;
                }
            }
        }

        let stop_chain = match self.awards.on_verified_completion(&task).await {
            Ok(stop) => stop,
            Err(err) => {
                self.file_side_effect_fault(&task, "award evaluation", &err.to_string())
                    .await?;
                false
            }
        };
        let routing = if stop_chain {
            tracing::debug!(task = %task.id(), "routing suppressed by award stop-chain");
            RoutingReport::default()
        } else {
            match self.router.route(&task).await {
                Ok(report) => report,
                Err(EngineError::Assignment(failure)) => {
                    // An unresolvable successor assignee rejects the
                    // completion outright: the commit is rolled back and
                    // the task handed back to its user.
                    task.reopen(&*self.clock)?;
                    self.tasks.update(&task).await?;
                    tracing::warn!(task = %task.id(), %failure, "completion rolled back");
                    return Err(EngineError::Assignment(failure));
                }
                Err(err) => {
                    self.file_side_effect_fault(&task, "routing", &err.to_string())
                        .await?;
                    RoutingReport::default()
                }
            }
        };
        let outcome = self.direct_successor(&task, &routing).await?;

        Ok(CompletionReceipt {
            task,
            quiz: quiz_outcome,
            webhook: webhook_delivery,
            routing,
            completed: true,
            outcome,
        })
    }

    /// Resolves whether the user has a unique direct successor to
    /// continue with, and whether it crosses into another campaign.
    async fn direct_successor(
        &self,
        trigger: &Task,
        routing: &RoutingReport,
    ) -> EngineResult<CompletionOutcome> {
        let Some(user) = trigger.assignee() else {
            return Ok(CompletionOutcome::Saved);
        };
        let mut direct = None;
        for id in &routing.assigned {
            let Some(candidate) = self.tasks.find_by_id(*id).await? else {
                continue;
            };
            if candidate.assignee() != Some(user) {
                continue;
            }
            if direct.is_some() {
                // Several follow-ups: the user picks from their listing.
                return Ok(CompletionOutcome::Saved);
            }
            direct = Some(candidate);
        }
        let Some(successor) = direct else {
            return Ok(CompletionOutcome::Saved);
        };
        let from = self.graph.campaign_of_stage(trigger.stage()).await?;
        let to = self.graph.campaign_of_stage(successor.stage()).await?;
        let is_new_campaign = match (from, to) {
            (Some(origin), Some(target)) => origin.id() != target.id(),
            _ => false,
        };
        Ok(CompletionOutcome::NextDirect {
            task: successor.id(),
            is_new_campaign,
        })
    }

    /// Grades the submission against the stage's answer key and writes
    /// the feedback into the responses.
    ///
    /// A missing answer key files a fault and skips grading rather than
    /// blocking the submission.
    async fn grade(&self, quiz: &Quiz, task: &mut Task) -> EngineResult<Option<QuizOutcome>> {
        let rows = self
            .tasks
            .completed_responses_for_case(task.case(), quiz.answer_stage)
            .await?;
        let Some(answers) = rows.last() else {
            self.faults
                .record(
                    FaultKind::DependencyMissing,
                    &format!("quiz answer key missing at stage {}", quiz.answer_stage),
                    Some(task.id()),
                    None,
                )
                .await?;
            return Ok(None);
        };
        let outcome = quiz.grade(answers, &task.responses_or_empty());
        let mut feedback = Map::new();
        feedback.insert(SCORE_META.to_owned(), json!(outcome.score));
        if quiz.provide_answers && quiz.reveals_answers(outcome.passed) {
            feedback.insert(INCORRECT_META.to_owned(), json!(outcome.incorrect));
        }
        task.merge_responses(feedback, &*self.clock);
        Ok(Some(outcome))
    }

    async fn file_side_effect_fault(
        &self,
        task: &Task,
        label: &str,
        detail: &str,
    ) -> EngineResult<()> {
        tracing::warn!(task = %task.id(), label, detail, "side effect failed after commit");
        self.faults
            .record(
                FaultKind::SideEffectFailure,
                &format!("{label} failed after completing task {}: {detail}", task.id()),
                Some(task.id()),
                None,
            )
            .await?;
        Ok(())
    }
}
