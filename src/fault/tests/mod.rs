//! Unit tests for the fault context.

mod recorder_tests;
