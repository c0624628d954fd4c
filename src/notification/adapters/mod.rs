//! Adapter implementations for the notification context.

pub mod memory;
