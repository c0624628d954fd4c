//! Adapter implementations for the task context.

pub mod memory;
