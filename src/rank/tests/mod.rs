//! Unit tests for the rank context.

mod award_tests;
