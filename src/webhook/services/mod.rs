//! Webhook execution services.

mod executor;

pub use executor::{WebhookDelivery, WebhookError, WebhookExecutor, WebhookResult};
