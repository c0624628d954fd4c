//! Routing, assignment, validation, and the completion transaction.

mod assignment;
mod completion;
mod router;
mod validation;

pub use assignment::{AssignmentEngine, AssignmentOutcome};
pub use completion::{CompletionOutcome, CompletionReceipt, CompletionService};
pub use router::{Router, RoutingReport};
pub use validation::validate_responses;
