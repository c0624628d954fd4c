//! Campaign graph: campaigns, tracks, chains, and the stage DAG.
//!
//! The graph is the static configuration the routing engine walks. It
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
