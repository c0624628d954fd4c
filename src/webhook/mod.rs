//! Outbound webhooks with template injection and response projection.
//!
//! A stage-bound [`domain::Webhook`] builds a payload from task data,
//! injects `@TURNIP_` markers into its URL and body templates, performs
//! the HTTP call through the [`ports::HttpClient`] port, and projects
//! the JSON response back into the task's maps. Failures are filed as
//! faults and never mutate the task.
//!
//! - Descriptor and injection scanner in [`domain`]
//! - HTTP port contract in [`ports`]
//! - The reqwest-backed client in [`adapters`]
//! - The executor service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
