//! Per-user per-stage creation, selection, and submission limits.

use super::RankId;
use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};

/// Bounds and toggles a rank's access to one stage.
///
/// `open_limit` caps a user's incomplete tasks at the stage and
/// `total_limit` caps all of their tasks there; zero means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLimit {
    /// Rank the limit applies to.
    pub rank: RankId,
    /// Stage the limit guards.
    pub stage: StageId,
    /// Maximum simultaneously open tasks; zero is unbounded.
    pub open_limit: u32,
    /// Maximum tasks overall; zero is unbounded.
    pub total_limit: u32,
    /// Stage tasks appear in listings for this rank.
    pub is_listing_open: bool,
    /// Holders may claim unassigned tasks at the stage.
    pub is_selection_open: bool,
    /// Holders may create tasks at the stage.
    pub is_creation_open: bool,
    /// Holders may submit completions at the stage.
    pub is_submission_open: bool,
}

impl RankLimit {
    /// Creates an unbounded, fully open limit for a rank/stage pair.
    #[must_use]
    pub const fn new(rank: RankId, stage: StageId) -> Self {
        Self {
            rank,
            stage,
            open_limit: 0,
            total_limit: 0,
            is_listing_open: true,
            is_selection_open: true,
            is_creation_open: true,
            is_submission_open: true,
        }
    }

    /// Caps simultaneously open tasks.
    #[must_use]
    pub const fn with_open_limit(mut self, open_limit: u32) -> Self {
        self.open_limit = open_limit;
        self
    }

    /// Caps total tasks.
    #[must_use]
    pub const fn with_total_limit(mut self, total_limit: u32) -> Self {
        self.total_limit = total_limit;
        self
    }

    /// Toggles creation access.
    #[must_use]
    pub const fn with_creation_open(mut self, open: bool) -> Self {
        self.is_creation_open = open;
        self
    }

    /// Toggles selection access.
    #[must_use]
    pub const fn with_selection_open(mut self, open: bool) -> Self {
        self.is_selection_open = open;
        self
    }

    /// Toggles submission access.
    #[must_use]
    pub const fn with_submission_open(mut self, open: bool) -> Self {
        self.is_submission_open = open;
        self
    }

    /// Toggles listing visibility.
    #[must_use]
    pub const fn with_listing_open(mut self, open: bool) -> Self {
        self.is_listing_open = open;
        self
    }
}
