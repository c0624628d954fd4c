//! Domain model for rank-based access and completion-threshold awards.

mod award;
mod ids;
mod limit;
mod rank;

pub use award::TaskAward;
pub use ids::RankId;
pub use limit::RankLimit;
pub use rank::{Rank, RankRecord};
