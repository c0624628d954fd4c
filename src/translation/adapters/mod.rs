//! Adapter implementations for translation persistence.

pub mod memory;
