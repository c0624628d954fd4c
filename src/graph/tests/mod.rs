//! Unit tests for the graph context.

mod predicate_tests;
