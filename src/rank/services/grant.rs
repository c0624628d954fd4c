//! Rank granting with prerequisite-rank closure.

use crate::rank::{
    domain::{RankId, RankRecord},
    ports::{RankRepository, RankRepositoryError},
};
use crate::task::domain::UserId;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for rank granting.
#[derive(Debug, Error)]
pub enum RankGrantError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RankRepositoryError),
}

/// Result type for grant operations.
pub type RankGrantResult<T> = Result<T, RankGrantError>;

/// Grants ranks and derives prerequisite-based ranks transitively.
///
/// After any membership record is created, every rank whose non-empty
/// prerequisite set is covered by the user's ranks is granted as well,
/// repeating until a fixpoint. Grants are idempotent per `(user, rank)`.
#[derive(Clone)]
pub struct RankGrantService<R, C>
where
    R: RankRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RankGrantService<R, C>
where
    R: RankRepository,
    C: Clock + Send + Sync,
{
    /// Creates a grant service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Grants a rank to a user and closes over prerequisites.
    ///
    /// Returns the ranks newly granted by this call, the requested one
    /// first; an empty vector means the user already held the rank.
    ///
    /// # Errors
    ///
    /// Returns [`RankGrantError::Repository`] when persistence fails.
    pub async fn grant(&self, user: UserId, rank: RankId) -> RankGrantResult<Vec<RankId>> {
        let mut granted = Vec::new();
        let created = self
            .repository
            .grant(RankRecord::new(user, rank, &*self.clock))
            .await?;
        if !created {
            return Ok(granted);
        }
        granted.push(rank);
        tracing::debug!(%user, %rank, "rank granted");

        let definitions = self.repository.ranks().await?;
        let mut held: HashSet<RankId> = self
            .repository
            .ranks_of_user(user)
            .await?
            .iter()
            .map(crate::rank::domain::Rank::id)
            .collect();

        // Monotone closure: each pass can only add ranks, so this
        // terminates after at most |definitions| passes.
        loop {
            let mut changed = false;
            for definition in &definitions {
                if held.contains(&definition.id()) || definition.prerequisite_ranks().is_empty() {
                    continue;
                }
                let covered = definition
                    .prerequisite_ranks()
                    .iter()
                    .all(|prerequisite| held.contains(prerequisite));
                if !covered {
                    continue;
                }
                let derived = self
                    .repository
                    .grant(RankRecord::new(user, definition.id(), &*self.clock))
                    .await?;
                held.insert(definition.id());
                if derived {
                    granted.push(definition.id());
                    changed = true;
                    tracing::debug!(%user, rank = %definition.id(), "prerequisite rank derived");
                }
            }
            if !changed {
                break;
            }
        }
        Ok(granted)
    }
}
