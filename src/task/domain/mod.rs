//! Domain model for cases and tasks.
//!
//! A case groups every task arising from one initial trigger; a task is
//! the runtime unit of work at one stage. The aggregate enforces the
//! lifecycle flag coupling: `complete` is only set by a successful write
//! or a forced completion, and `reopened` marks tasks that were sent back.

mod error;
mod ids;
mod task;

pub use error::TaskDomainError;
pub use ids::{CaseId, TaskId, UserId};
pub use task::Task;
