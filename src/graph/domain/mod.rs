//! Domain model for the campaign graph.
//!
//! Campaigns own chains; chains own stages; stages carry the directed
//! edges that the routing engine walks one hop at a time. All
//! infrastructure concerns stay outside the domain boundary.

mod campaign;
mod chain;
mod error;
mod ids;
mod predicate;
mod stage;

pub use campaign::{Campaign, Track};
pub use chain::Chain;
pub use error::GraphDomainError;
pub use ids::{CampaignId, ChainId, StageId, TrackId};
pub use predicate::{ConditionOp, FieldType, PredicateClause, evaluate_all};
pub use stage::{
    AssignPolicy, ConditionalStageConfig, PreviousManual, Stage, StageKind, TaskStageConfig,
};
