//! Unit tests for the translation context.

mod translator_tests;
