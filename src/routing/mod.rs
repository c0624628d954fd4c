//! The task lifecycle engine: routing, assignment, and completion.
//!
//! A completion is committed under the task row lock, then its side
//! effects run: webhook delivery, award evaluation, and one routing hop
//! along the stage graph. Side-effect failures file faults and never
//! undo the commit.
//!
//! - Error taxonomy in [`error`]
//! - The engine services in [`services`]

pub mod error;
pub mod services;

pub use error::{AssignmentFailure, EngineError, EngineResult, ErrorEnvelope};
pub use services::{
    AssignmentEngine, AssignmentOutcome, CompletionReceipt, CompletionService, Router,
    RoutingReport, validate_responses,
};

#[cfg(test)]
mod tests;
