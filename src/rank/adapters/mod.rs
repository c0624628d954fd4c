//! Adapter implementations for the rank context.

pub mod memory;
