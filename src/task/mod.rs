//! Case and task store.
//!
//! Tasks are the single hot contention point of the engine; every
//! completion goes through the repository's non-blocking row lock, and
//! integrator fan-in resolves through an atomic get-or-create. The module
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
