//! Turnip: graph-driven task-workflow engine.
//!
//! This crate models campaigns whose work is a directed graph of stages.
//! Completing a task routes its case along the graph: conditional stages
//! steer or bounce it back, integration stages fan several tasks into
//! one, webhooks call out to external services, and ranks decide who may
//! see, claim, and create tasks.
//!
//! # Architecture
//!
//! Turnip follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory stores,
//!   HTTP clients, etc.)
//!
//! # Modules
//!
//! - [`graph`]: Campaigns, chains, stages, and predicate evaluation
//! - [`task`]: Tasks, cases, and the task repository contract
//! - [`routing`]: The lifecycle engine: routing, assignment, completion
//! - [`rank`]: Ranks, limits, awards, and user membership
//! - [`pipeline`]: Copy-field, dynamic-json, integration, and quiz rules
//! - [`webhook`]: Outbound webhooks with marker injection
//! - [`notification`]: Templates, automatic bindings, and read statuses
//! - [`fault`]: The error-campaign fault ledger
//! - [`translation`]: Schema-title harvesting and translator fan-out
//! - [`query`]: Gateway services mirroring the external API surface

pub mod fault;
pub mod graph;
pub mod notification;
pub mod pipeline;
pub mod query;
pub mod rank;
pub mod routing;
pub mod task;
pub mod translation;
pub mod webhook;
