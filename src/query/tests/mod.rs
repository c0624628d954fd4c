//! Unit tests for the query surface.


mod notification_gateway_tests;
mod translation_flow_tests;
