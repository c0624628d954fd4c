//! Rank-based access control and completion-threshold awards.
//!
//! Ranks gate stage access through [`domain::RankLimit`] rows;
//! [`domain::TaskAward`] watches completion/verified stage pairs and
//! grants ranks at thresholds; prerequisite ranks derive transitively.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
