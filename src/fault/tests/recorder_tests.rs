//! Fault recorder tests.

use crate::fault::{
    adapters::memory::InMemoryFaultRepository,
    domain::FaultKind,
    ports::FaultRepository,
    services::FaultRecorder,
};
use crate::graph::adapters::memory::GraphBuilder;
use crate::task::domain::TaskId;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn faults_are_filed_under_the_error_campaign() {
    let mut builder = GraphBuilder::new();
    let (error_campaign, _) = builder.error_campaign().expect("error campaign");
    let graph = Arc::new(builder.build());
    let faults = Arc::new(InMemoryFaultRepository::new());
    let recorder = FaultRecorder::new(Arc::clone(&faults), graph, Arc::new(DefaultClock));
    let trigger = TaskId::new();

    let id = recorder
        .record(
            FaultKind::WebhookFailure,
            "endpoint returned 503",
            Some(trigger),
            Some(json!({"status": 503})),
        )
        .await
        .expect("record");
    assert!(id.is_some());

    let filed = faults
        .faults_for_campaign(error_campaign)
        .await
        .expect("list");
    assert_eq!(filed.len(), 1);
    let item = filed.first().expect("one fault");
    assert_eq!(item.kind(), FaultKind::WebhookFailure);
    assert_eq!(item.trigger_task(), Some(trigger));
    assert_eq!(item.payload(), Some(&json!({"status": 503})));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recording_without_an_error_campaign_drops_the_fault() {
    let graph = Arc::new(GraphBuilder::new().build());
    let faults = Arc::new(InMemoryFaultRepository::new());
    let recorder = FaultRecorder::new(Arc::clone(&faults), graph, Arc::new(DefaultClock));

    let id = recorder
        .record(FaultKind::DependencyMissing, "stage vanished", None, None)
        .await
        .expect("record");

    assert!(id.is_none());
}
