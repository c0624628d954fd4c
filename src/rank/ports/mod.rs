//! Port contracts for the rank context.

mod repository;

pub use repository::{
    RankRepository, RankRepositoryError, RankRepositoryResult, UserDirectory,
};
