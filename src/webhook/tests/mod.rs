//! Unit tests for the webhook context.

mod executor_tests;
mod injection_tests;
