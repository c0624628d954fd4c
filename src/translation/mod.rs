//! Schema-title translation through translator tasks.
//!
//! Stages with translation adapters harvest the `title` strings of
//! their JSON schema into campaign-scoped, content-addressed
//! [`domain::TranslateKey`] rows. Translator tasks fan out per target
//! language; completing one stores [`domain::Translation`] rows, and
//! schema fetches with a language parameter come back rewritten.
//!
//! - Domain types in [`domain`]
//! - Port contract in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The orchestration service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
