//! Adapter implementations for the graph context.

pub mod memory;
