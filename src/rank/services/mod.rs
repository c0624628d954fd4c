//! Orchestration services for the rank context.

mod award;
mod grant;
mod limits;

pub use award::{AwardError, AwardResult, AwardService};
pub use grant::{RankGrantError, RankGrantResult, RankGrantService};
pub use limits::{LimitAction, LimitGate, LimitGateError, LimitGateResult, LimitRefusal};
