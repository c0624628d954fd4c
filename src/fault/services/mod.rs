//! Fault recording services.

mod recorder;

pub use recorder::{FaultRecorder, FaultRecorderError, FaultRecorderResult};
