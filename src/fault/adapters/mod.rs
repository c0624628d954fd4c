//! Adapter implementations for fault persistence.

pub mod memory;
