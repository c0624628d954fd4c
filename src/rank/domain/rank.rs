//! Ranks and rank membership records.

use super::RankId;
use crate::graph::domain::TrackId;
use crate::task::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A role granting access to stages within a track.
///
/// `priority` orders ranks within a track; highest-rank stage filtering
/// keeps only stages reachable through a user's maximal-priority ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    id: RankId,
    name: String,
    track: TrackId,
    priority: u32,
    prerequisite_ranks: Vec<RankId>,
}

impl Rank {
    /// Creates a rank on a track.
    #[must_use]
    pub fn new(name: impl Into<String>, track: TrackId, priority: u32) -> Self {
        Self {
            id: RankId::new(),
            name: name.into(),
            track,
            priority,
            prerequisite_ranks: Vec::new(),
        }
    }

    /// Declares prerequisite ranks; holding all of them derives this rank.
    #[must_use]
    pub fn with_prerequisites(mut self, prerequisites: impl IntoIterator<Item = RankId>) -> Self {
        self.prerequisite_ranks = prerequisites.into_iter().collect();
        self
    }

    /// Returns the rank identifier.
    #[must_use]
    pub const fn id(&self) -> RankId {
        self.id
    }

    /// Returns the rank name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning track.
    #[must_use]
    pub const fn track(&self) -> TrackId {
        self.track
    }

    /// Returns the ordering priority within the track.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns the prerequisite ranks.
    #[must_use]
    pub fn prerequisite_ranks(&self) -> &[RankId] {
        &self.prerequisite_ranks
    }
}

/// A user's membership in a rank.
///
/// Records are unique per `(user, rank)`; grants are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    user: UserId,
    rank: RankId,
    granted_at: DateTime<Utc>,
}

impl RankRecord {
    /// Creates a membership record timestamped by the clock.
    #[must_use]
    pub fn new(user: UserId, rank: RankId, clock: &impl Clock) -> Self {
        Self {
            user,
            rank,
            granted_at: clock.utc(),
        }
    }

    /// Returns the member user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Returns the granted rank.
    #[must_use]
    pub const fn rank(&self) -> RankId {
        self.rank
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub const fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }
}
