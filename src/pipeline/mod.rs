//! Data pipeline rules attached to task stages.
//!
//! Five rule families reshape data as tasks move through the graph:
//! [`CopyField`] copies named response fields from earlier tasks,
//! [`Integration`] projects responses into fan-in group keys,
//! [`DynamicJson`] filters or populates schema enums from completed
//! responses, [`Quiz`] grades responses against an answer key, and
//! [`CampaignLinker`] opens follow-up work in a linked campaign.
//!
//! - Rule types in [`domain`]
//! - Repository-backed appliers in [`services`]

pub mod domain;
pub mod services;

pub use domain::{
    CampaignLinker, CopyField, DynamicJson, Integration, Quiz, QuizOutcome, ShowAnswer,
    SourceScope,
};

#[cfg(test)]
mod tests;
