//! In-memory adapters for the rank context.

mod rank;

pub use rank::{InMemoryRankRepository, InMemoryUserDirectory};
