//! Unit tests for the pipeline context.

mod dynamic_json_tests;
