//! Error types for graph domain validation.

use thiserror::Error;

/// Errors returned while constructing graph domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphDomainError {
    /// A named entity was given a blank name.
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// An edge references a stage outside the graph.
    #[error("edge references unknown stage: {0}")]
    UnknownStage(String),
}
