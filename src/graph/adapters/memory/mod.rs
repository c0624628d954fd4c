//! In-memory adapters for the graph context.

mod graph;

pub use graph::{GraphBuilder, InMemoryGraphRepository};
