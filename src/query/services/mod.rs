//! Gateway services composing the engine for API consumers.

mod campaigns;
mod notifications;
mod tasks;

pub use campaigns::{CampaignGateway, IndividualChainView};
pub use notifications::{NotificationGateway, NotificationRead};
pub use tasks::{TaskGateway, TaskView};
