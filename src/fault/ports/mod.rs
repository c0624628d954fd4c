//! Port contracts for fault persistence.

mod repository;

pub use repository::{FaultRepository, FaultRepositoryError, FaultRepositoryResult};
