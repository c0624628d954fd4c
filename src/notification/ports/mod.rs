//! Port contracts for the notification context.

mod repository;

pub use repository::{
    NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult,
};
