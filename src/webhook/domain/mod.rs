//! Domain model for webhook descriptors and template injection.

mod injection;
mod webhook;

pub use injection::{InjectionContext, inject_text, inject_value, referenced_stages};
pub use webhook::{HttpMethod, TargetProjection, Webhook, WhichResponses};
