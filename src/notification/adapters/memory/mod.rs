//! In-memory adapters for the notification context.

mod notification;

pub use notification::InMemoryNotificationRepository;
