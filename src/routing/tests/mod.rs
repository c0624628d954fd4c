//! Unit tests for the lifecycle engine.

mod fixtures;

mod router_tests;
mod validation_tests;
