//! Filing of side-effect faults under the internal error campaign.

use crate::fault::{
    domain::{ErrorItem, FaultId, FaultKind},
    ports::{FaultRepository, FaultRepositoryError},
};
use crate::graph::ports::{GraphRepository, GraphRepositoryError};
use crate::task::domain::TaskId;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for fault recording.
#[derive(Debug, Error)]
pub enum FaultRecorderError {
    /// Fault repository operation failed.
    #[error(transparent)]
    Fault(#[from] FaultRepositoryError),
    /// Graph repository operation failed.
    #[error(transparent)]
    Graph(#[from] GraphRepositoryError),
}

/// Result type for fault recording.
pub type FaultRecorderResult<T> = Result<T, FaultRecorderError>;

/// Files faults under the reserved internal error campaign.
///
/// Without a configured error campaign the fault is logged and
/// dropped; recording must never fail the side effect that raised it
/// harder than the side effect itself.
#[derive(Clone)]
pub struct FaultRecorder<F, G, C>
where
    F: FaultRepository,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    faults: Arc<F>,
    graph: Arc<G>,
    clock: Arc<C>,
}

impl<F, G, C> FaultRecorder<F, G, C>
where
    F: FaultRepository,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    /// Creates a fault recorder.
    #[must_use]
    pub const fn new(faults: Arc<F>, graph: Arc<G>, clock: Arc<C>) -> Self {
        Self {
            faults,
            graph,
            clock,
        }
    }

    /// Records a fault, returning its identifier when one was filed.
    ///
    /// # Errors
    ///
    /// Returns [`FaultRecorderError`] when the error campaign lookup or
    /// the append fails.
    pub async fn record(
        &self,
        kind: FaultKind,
        detail: &str,
        trigger_task: Option<TaskId>,
        payload: Option<Value>,
    ) -> FaultRecorderResult<Option<FaultId>> {
        let Some(campaign) = self.graph.error_campaign().await? else {
            tracing::warn!(?kind, detail, "fault dropped: no error campaign configured");
            return Ok(None);
        };
        let mut item = ErrorItem::new(campaign.id(), kind, detail, &*self.clock);
        if let Some(task) = trigger_task {
            item = item.with_trigger_task(task);
        }
        if let Some(body) = payload {
            item = item.with_payload(body);
        }
        tracing::warn!(?kind, detail, fault = %item.id(), "side-effect fault recorded");
        self.faults.append(&item).await?;
        Ok(Some(item.id()))
    }
}
