//! Webhook executor tests.

use crate::fault::{
    adapters::memory::InMemoryFaultRepository,
    domain::FaultKind,
    ports::FaultRepository,
    services::FaultRecorder,
};
use crate::graph::adapters::memory::{GraphBuilder, InMemoryGraphRepository};
use crate::graph::domain::{CampaignId, StageId};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{CaseId, Task},
    ports::TaskRepository,
};
use crate::webhook::domain::{TargetProjection, Webhook};
use crate::webhook::ports::{HttpResponse, MockHttpClient};
use crate::webhook::services::WebhookExecutor;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Map, Value, json};
use std::sync::Arc;

type Executor = WebhookExecutor<
    MockHttpClient,
    InMemoryTaskRepository,
    InMemoryFaultRepository,
    InMemoryGraphRepository,
    DefaultClock,
>;

struct Fixture {
    tasks: Arc<InMemoryTaskRepository>,
    faults: Arc<InMemoryFaultRepository>,
    error_campaign: CampaignId,
    executor: Executor,
}

fn fixture(http: MockHttpClient) -> Fixture {
    let mut builder = GraphBuilder::new();
    let (error_campaign, _) = builder.error_campaign().expect("error campaign");
    let graph = Arc::new(builder.build());
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let faults = Arc::new(InMemoryFaultRepository::new());
    let clock = Arc::new(DefaultClock);
    let executor = WebhookExecutor::new(
        Arc::new(http),
        Arc::clone(&tasks),
        FaultRecorder::new(Arc::clone(&faults), graph, Arc::clone(&clock)),
        clock,
    );
    Fixture {
        tasks,
        faults,
        error_campaign,
        executor,
    }
}

fn map(value: Value) -> Map<String, Value> {
    value
        .as_object()
        .cloned()
        .expect("test value must be an object")
}

fn ok_response(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn success_merges_projected_targets() {
    let mut http = MockHttpClient::new();
    http.expect_send()
        .returning(|_| Ok(ok_response(json!({"verdict": "approved", "score": 9}))));
    let fix = fixture(http);

    let clock = DefaultClock;
    let mut task = Task::new(StageId::new(), CaseId::new(), &clock);
    task.set_responses(map(json!({"name": "kloop"})), &clock);
    let webhook = Webhook::new("https://api.test/check")
        .with_responses_target(TargetProjection::whole_body());

    let delivery = fix
        .executor
        .execute(&webhook, &mut task)
        .await
        .expect("execute");

    assert!(delivery.ok);
    assert_eq!(
        task.responses_or_empty(),
        map(json!({"name": "kloop", "verdict": "approved", "score": 9}))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn field_projection_wraps_non_object_results() {
    let mut http = MockHttpClient::new();
    http.expect_send()
        .returning(|_| Ok(ok_response(json!({"score": 42}))));
    let fix = fixture(http);

    let clock = DefaultClock;
    let mut task = Task::new(StageId::new(), CaseId::new(), &clock);
    let webhook = Webhook::new("https://api.test/score")
        .with_internal_metadata_target(TargetProjection::field("score"));

    fix.executor
        .execute(&webhook, &mut task)
        .await
        .expect("execute");

    assert_eq!(
        task.internal_metadata().cloned(),
        Some(map(json!({"score": 42})))
    );
    assert!(task.responses().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn current_task_responses_form_the_payload() {
    let mut http = MockHttpClient::new();
    http.expect_send()
        .withf(|request| request.body == Some(json!({"name": "kloop"})))
        .returning(|_| Ok(ok_response(json!({}))));
    let fix = fixture(http);

    let clock = DefaultClock;
    let mut task = Task::new(StageId::new(), CaseId::new(), &clock);
    task.set_responses(map(json!({"name": "kloop"})), &clock);
    let webhook = Webhook::new("https://api.test/echo").with_which_responses(
        crate::webhook::domain::WhichResponses::CurrentTaskResponses,
    );

    let delivery = fix
        .executor
        .execute(&webhook, &mut task)
        .await
        .expect("execute");

    assert!(delivery.ok);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn in_responses_payload_lists_predecessors() {
    let mut http = MockHttpClient::new();
    http.expect_send()
        .withf(|request| request.body == Some(json!([{"oik": 4}, {"oik": 5}])))
        .returning(|_| Ok(ok_response(json!({}))));
    let fix = fixture(http);

    let clock = DefaultClock;
    let stage = StageId::new();
    let case = CaseId::new();
    let mut first = Task::new(stage, case, &clock);
    first.set_responses(map(json!({"oik": 4})), &clock);
    let mut second = Task::new(stage, case, &clock);
    second.set_responses(map(json!({"oik": 5})), &clock);
    fix.tasks.store(&first).await.expect("store first");
    fix.tasks.store(&second).await.expect("store second");

    let mut integrator = Task::new(StageId::new(), case, &clock)
        .with_in_task(first.id())
        .with_in_task(second.id());
    let webhook = Webhook::new("https://api.test/collect");

    let delivery = fix
        .executor
        .execute(&webhook, &mut integrator)
        .await
        .expect("execute");

    assert!(delivery.ok);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_success_status_records_a_fault_and_leaves_the_task_alone() {
    let mut http = MockHttpClient::new();
    http.expect_send().returning(|_| {
        Ok(HttpResponse {
            status: 503,
            body: "busy".to_owned(),
        })
    });
    let fix = fixture(http);

    let clock = DefaultClock;
    let mut task = Task::new(StageId::new(), CaseId::new(), &clock);
    let before = task.clone();
    let webhook = Webhook::new("https://api.test/down")
        .with_responses_target(TargetProjection::whole_body());

    let delivery = fix
        .executor
        .execute(&webhook, &mut task)
        .await
        .expect("execute");

    assert!(!delivery.ok);
    assert!(delivery.reason.is_some_and(|reason| reason.contains("503")));
    assert_eq!(task, before);

    let filed = fix
        .faults
        .faults_for_campaign(fix.error_campaign)
        .await
        .expect("faults");
    assert_eq!(filed.len(), 1);
    assert_eq!(
        filed.first().map(crate::fault::domain::ErrorItem::kind),
        Some(FaultKind::WebhookFailure)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_json_body_records_a_fault() {
    let mut http = MockHttpClient::new();
    http.expect_send().returning(|_| {
        Ok(HttpResponse {
            status: 200,
            body: "<html>redirect</html>".to_owned(),
        })
    });
    let fix = fixture(http);

    let clock = DefaultClock;
    let mut task = Task::new(StageId::new(), CaseId::new(), &clock);
    let webhook = Webhook::new("https://api.test/html")
        .with_responses_target(TargetProjection::whole_body());

    let delivery = fix
        .executor
        .execute(&webhook, &mut task)
        .await
        .expect("execute");

    assert!(!delivery.ok);
    let filed = fix
        .faults
        .faults_for_campaign(fix.error_campaign)
        .await
        .expect("faults");
    assert_eq!(filed.len(), 1);
}
