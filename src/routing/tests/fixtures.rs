//! Shared engine composition for routing and completion tests.

use crate::fault::{adapters::memory::InMemoryFaultRepository, services::FaultRecorder};
use crate::graph::adapters::memory::InMemoryGraphRepository;
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository, services::NotificationDispatch,
};
use crate::pipeline::services::FieldCopier;
use crate::rank::{
    adapters::memory::{InMemoryRankRepository, InMemoryUserDirectory},
    services::{AwardService, LimitGate, RankGrantService},
};
use crate::routing::services::{AssignmentEngine, CompletionService, Router};
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::webhook::{ports::MockHttpClient, services::WebhookExecutor};
use mockable::DefaultClock;
use std::sync::Arc;

pub type TestRouter = Router<
    InMemoryGraphRepository,
    InMemoryTaskRepository,
    InMemoryRankRepository,
    InMemoryUserDirectory,
    InMemoryNotificationRepository,
    InMemoryFaultRepository,
    MockHttpClient,
    DefaultClock,
>;

pub type TestCompletion = CompletionService<
    InMemoryGraphRepository,
    InMemoryTaskRepository,
    InMemoryRankRepository,
    InMemoryUserDirectory,
    InMemoryNotificationRepository,
    InMemoryFaultRepository,
    MockHttpClient,
    DefaultClock,
>;

pub struct Engine {
    pub graph: Arc<InMemoryGraphRepository>,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub ranks: Arc<InMemoryRankRepository>,
    pub users: Arc<InMemoryUserDirectory>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub faults: Arc<InMemoryFaultRepository>,
    pub clock: Arc<DefaultClock>,
    pub router: TestRouter,
    pub completion: TestCompletion,
}

pub fn engine(graph: InMemoryGraphRepository) -> Engine {
    engine_with_http(graph, MockHttpClient::new())
}

/// The mock client is not `Clone`, so every composed service is built
/// from the shared `Arc`s instead of cloning a sibling.
pub fn engine_with_http(graph: InMemoryGraphRepository, http: MockHttpClient) -> Engine {
    let graph = Arc::new(graph);
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let ranks = Arc::new(InMemoryRankRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let faults = Arc::new(InMemoryFaultRepository::new());
    let clock = Arc::new(DefaultClock);
    let http = Arc::new(http);

    let recorder = || {
        FaultRecorder::new(Arc::clone(&faults), Arc::clone(&graph), Arc::clone(&clock))
    };
    let assignment = || {
        AssignmentEngine::new(
            Arc::clone(&tasks),
            Arc::clone(&ranks),
            Arc::clone(&users),
            Arc::clone(&graph),
            Arc::clone(&clock),
        )
    };
    let webhooks = || {
        WebhookExecutor::new(
            Arc::clone(&http),
            Arc::clone(&tasks),
            recorder(),
            Arc::clone(&clock),
        )
    };
    let dispatch =
        || NotificationDispatch::new(Arc::clone(&notifications), Arc::clone(&clock));
    let router = || {
        Router::new(
            Arc::clone(&graph),
            Arc::clone(&tasks),
            assignment(),
            FieldCopier::new(Arc::clone(&tasks)),
            webhooks(),
            dispatch(),
            recorder(),
            Arc::clone(&clock),
        )
    };
    let limits = LimitGate::new(Arc::clone(&ranks), Arc::clone(&tasks));
    let grants = RankGrantService::new(Arc::clone(&ranks), Arc::clone(&clock));
    let awards = AwardService::new(Arc::clone(&ranks), Arc::clone(&tasks), grants, dispatch());
    let completion = CompletionService::new(
        Arc::clone(&graph),
        Arc::clone(&tasks),
        limits,
        awards,
        router(),
        webhooks(),
        recorder(),
        Arc::clone(&clock),
    );
    let router = router();

    Engine {
        graph,
        tasks,
        ranks,
        users,
        notifications,
        faults,
        clock,
        router,
        completion,
    }
}
