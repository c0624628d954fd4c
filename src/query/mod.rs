//! The query surface: service operations mirroring the external API.
//!
//! Three gateways wrap the engine for consumers: [`services::TaskGateway`]
//! for task creation, reads, claims, and completions;
//! [`services::CampaignGateway`] for membership, stage visibility, and
//! individual-chain roll-ups; and [`services::NotificationGateway`] for
//! notification reads. HTTP framing sits outside this crate; errors carry
//! a status hint for whoever adds it.

pub mod services;

pub use services::{
    CampaignGateway, IndividualChainView, NotificationGateway, NotificationRead, TaskGateway,
    TaskView,
};

#[cfg(test)]
mod tests;
