//! Stage nodes of the campaign graph.
//!
//! A stage is either a task stage (produces user-visible tasks) or a
//! conditional stage (predicate-only router). The two variants share a
//! common header (`id`, `chain`, `name`, `order`) and are discriminated by
//! [`StageKind`] rather than inheritance.

use super::{ChainId, GraphDomainError, PredicateClause, StageId};
use crate::pipeline::{CampaignLinker, CopyField, DynamicJson, Integration, Quiz};
use crate::rank::domain::RankId;
use crate::translation::domain::TranslationAdapter;
use crate::webhook::domain::Webhook;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Policy deciding who works a freshly routed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignPolicy {
    /// Leave the task unassigned; any user whose rank opens selection on
    /// the stage may claim it.
    #[default]
    Rank,
    /// Copy the assignee from the latest completed case-scoped task at
    /// `assign_user_from_stage`.
    Stage,
    /// Leave the task unassigned and complete it immediately during
    /// routing.
    AutoComplete,
    /// Resolve the assignee from a field of an earlier task's responses.
    PreviousManual,
}

/// Configuration for [`AssignPolicy::PreviousManual`].
///
/// The named field of the latest completed case-scoped task at
/// `source_stage` holds the target user's email or identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousManual {
    /// Stage whose responses carry the user handle.
    pub source_stage: StageId,
    /// Response field holding the email or identifier.
    pub field: String,
}

/// Configuration carried by a task stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskStageConfig {
    /// JSON schema validated against task responses on completion.
    pub json_schema: Option<Value>,
    /// UI schema shipped alongside the JSON schema.
    pub ui_schema: Option<Value>,
    /// Assignment policy for tasks routed onto this stage.
    pub assign_user_by: AssignPolicy,
    /// Source stage for [`AssignPolicy::Stage`].
    pub assign_user_from_stage: Option<StageId>,
    /// Copy the whole predecessor response map onto new tasks.
    pub copy_input: bool,
    /// Users may create tasks here directly (initial stages).
    pub is_creatable: bool,
    /// Completed predecessors may be reopened from tasks at this stage.
    pub allow_go_back: bool,
    /// Assignees may release claimed tasks back to the pool.
    pub allow_release: bool,
    /// Tasks at this stage are readable without authentication.
    pub is_public: bool,
    /// Multiple file attachments are accepted by the stage form.
    pub allow_multiple_files: bool,
    /// Individual-chain roll-ups skip empty tasks at this stage.
    pub skip_empty_individual_tasks: bool,
    /// Completing a task here completes the user's individual chain.
    pub complete_individual_chain: bool,
    /// Earliest instant the stage accepts creations and selections.
    pub available_from: Option<DateTime<Utc>>,
    /// Latest instant the stage accepts creations and selections.
    pub available_to: Option<DateTime<Utc>>,
    /// Rank whose holders are assigned ahead of the normal policy.
    pub fast_track_rank: Option<RankId>,
    /// Fan-in grouping of inbound tasks by projected response fields.
    pub integration: Option<Integration>,
    /// Cross-campaign join fired when tasks here complete.
    pub campaign_linker: Option<CampaignLinker>,
    /// Outbound webhook bound to this stage.
    pub webhook: Option<Webhook>,
    /// Quiz grading configuration.
    pub quiz: Option<Quiz>,
    /// Assignee resolution source for [`AssignPolicy::PreviousManual`].
    pub previous_manual: Option<PreviousManual>,
    /// Field-level copies applied when tasks are routed onto this stage.
    pub copy_fields: Vec<CopyField>,
    /// Schema reshaping rules applied at schema-load time.
    pub dynamic_jsons: Vec<DynamicJson>,
    /// Translation fan-out configured for this stage's schema titles.
    pub translation_adapters: Vec<TranslationAdapter>,
}

/// Configuration carried by a conditional stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionalStageConfig {
    /// AND-combined predicate clauses; empty passes unconditionally.
    pub conditions: Vec<PredicateClause>,
    /// Return the predecessor instead of routing forward when the
    /// predicate holds.
    pub pingpong: bool,
    /// When set, competing conditional siblings elect a single passing
    /// branch by smallest order.
    pub conditional_limit_order: Option<u32>,
}

/// Stage variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// Produces user-visible tasks.
    Task(TaskStageConfig),
    /// Predicate-only router.
    Conditional(ConditionalStageConfig),
}

/// A node of the campaign graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    chain: ChainId,
    name: String,
    order: u32,
    kind: StageKind,
}

impl Stage {
    /// Creates a stage with a validated name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank after
    /// trimming.
    pub fn new(
        chain: ChainId,
        name: impl Into<String>,
        order: u32,
        kind: StageKind,
    ) -> Result<Self, GraphDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphDomainError::EmptyName("stage"));
        }
        Ok(Self {
            id: StageId::new(),
            chain,
            name,
            order,
            kind,
        })
    }

    /// Returns the stage identifier.
    #[must_use]
    pub const fn id(&self) -> StageId {
        self.id
    }

    /// Returns the owning chain.
    #[must_use]
    pub const fn chain(&self) -> ChainId {
        self.chain
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display/order hint within the chain.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Returns the variant payload.
    #[must_use]
    pub const fn kind(&self) -> &StageKind {
        &self.kind
    }

    /// Returns the task configuration when this is a task stage.
    #[must_use]
    pub const fn task_config(&self) -> Option<&TaskStageConfig> {
        match &self.kind {
            StageKind::Task(config) => Some(config),
            StageKind::Conditional(_) => None,
        }
    }

    /// Returns the conditional configuration when this is a conditional
    /// stage.
    #[must_use]
    pub const fn conditional_config(&self) -> Option<&ConditionalStageConfig> {
        match &self.kind {
            StageKind::Conditional(config) => Some(config),
            StageKind::Task(_) => None,
        }
    }

    /// Returns whether the stage is a conditional router.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self.kind, StageKind::Conditional(_))
    }

    /// Returns whether the given instant falls inside the availability
    /// window of a task stage.
    ///
    /// Stages without a window, and conditional stages, are always
    /// available.
    #[must_use]
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        let Some(config) = self.task_config() else {
            return true;
        };
        let after_open = config.available_from.is_none_or(|from| now >= from);
        let before_close = config.available_to.is_none_or(|to| now <= to);
        after_open && before_close
    }
}
