//! Domain model for notifications.

mod auto;
mod ids;
mod notification;

pub use auto::{AutoNotification, Direction};
pub use ids::NotificationId;
pub use notification::{Notification, NotificationStatus};
