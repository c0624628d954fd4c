//! Cross-campaign joins fired on completion.

use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};

/// Opens a task in a linked campaign when a task completes here.
///
/// The joined task starts a fresh case in the target campaign and keeps
/// the completing user as its assignee, so their work continues across
/// the campaign boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignLinker {
    /// Stage in the linked campaign receiving the joined task.
    pub target_stage: StageId,
    /// Copy the completed responses onto the joined task.
    pub copy_input: bool,
}

impl CampaignLinker {
    /// Creates a linker targeting a stage of another campaign.
    #[must_use]
    pub const fn new(target_stage: StageId) -> Self {
        Self {
            target_stage,
            copy_input: false,
        }
    }

    /// Carries the completed responses across the join.
    #[must_use]
    pub const fn with_copy_input(mut self, copy_input: bool) -> Self {
        self.copy_input = copy_input;
        self
    }
}
