//! Structured fault recording under the internal error campaign.
//!
//! Side effects that fail after a completion has committed (webhook
//! delivery, routing, dangling graph references) are recorded as
//! [`domain::ErrorItem`]s instead of surfacing to the completing user.
//!
//! - Fault records in [`domain`]
//! - Port contract in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The recorder service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
