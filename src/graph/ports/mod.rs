//! Port contracts for the graph context.

mod repository;

pub use repository::{GraphRepository, GraphRepositoryError, GraphRepositoryResult};
