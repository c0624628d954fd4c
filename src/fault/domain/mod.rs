//! Domain model for recorded faults.

mod error_item;

pub use error_item::{ErrorItem, FaultId, FaultKind};
