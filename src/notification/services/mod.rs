//! Orchestration services for the notification context.

mod dispatch;

pub use dispatch::{NotificationDispatch, NotificationDispatchError, NotificationDispatchResult};
