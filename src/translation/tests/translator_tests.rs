//! Translation harvesting and rewriting tests.

use crate::graph::domain::{CampaignId, StageId};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::CaseId,
    ports::TaskRepository,
};
use crate::translation::{
    adapters::memory::InMemoryTranslationRepository,
    domain::{TranslationAdapter, content_hash},
    ports::TranslationRepository,
    services::TranslationService,
};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Map, Value, json};
use std::sync::Arc;

type Service =
    TranslationService<InMemoryTranslationRepository, InMemoryTaskRepository, DefaultClock>;

struct Fixture {
    repo: Arc<InMemoryTranslationRepository>,
    tasks: Arc<InMemoryTaskRepository>,
    service: Service,
    campaign: CampaignId,
}

fn fixture() -> Fixture {
    let repo = Arc::new(InMemoryTranslationRepository::new());
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let service = TranslationService::new(
        Arc::clone(&repo),
        Arc::clone(&tasks),
        Arc::new(DefaultClock),
    );
    Fixture {
        repo,
        tasks,
        service,
        campaign: CampaignId::new(),
    }
}

fn form_schema() -> Value {
    json!({
        "type": "object",
        "title": "Patient intake",
        "properties": {
            "name": {"type": "string", "title": "Full name"},
            "age": {"type": "integer", "title": "Age"}
        }
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn harvest_is_idempotent_per_campaign() {
    let fix = fixture();
    let stage = StageId::new();

    let first = fix
        .service
        .harvest(fix.campaign, stage, &form_schema())
        .await
        .expect("first harvest");
    assert_eq!(first.len(), 3);

    let second = fix
        .service
        .harvest(fix.campaign, stage, &form_schema())
        .await
        .expect("second harvest");
    assert!(second.is_empty());

    let keys = fix
        .repo
        .keys_for_campaign(fix.campaign)
        .await
        .expect("keys");
    assert_eq!(keys.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn translator_tasks_enumerate_untranslated_keys_by_hash() {
    let fix = fixture();
    let origin = StageId::new();
    let translator_stage = StageId::new();
    fix.service
        .harvest(fix.campaign, origin, &form_schema())
        .await
        .expect("harvest");

    let adapter = TranslationAdapter::new(translator_stage, "en", ["ky", "ru"]);
    let spawned = fix
        .service
        .spawn_translator_tasks(&adapter, fix.campaign, CaseId::new())
        .await
        .expect("spawn");

    // One batch per language; all keys share one origin stage.
    assert_eq!(spawned.len(), 2);
    let first = spawned.first().expect("task");
    assert_eq!(first.stage(), translator_stage);
    let schema = first.schema_override().expect("schema override");
    let properties = schema["properties"]
        .as_object()
        .expect("properties object");
    assert_eq!(properties.len(), 3);
    assert!(properties.contains_key(&content_hash("Full name")));

    let stored = fix.tasks.tasks_by_stage(translator_stage).await.expect("stored");
    assert_eq!(stored.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_translator_tasks_feed_schema_rewriting() {
    let fix = fixture();
    let origin = StageId::new();
    fix.service
        .harvest(fix.campaign, origin, &form_schema())
        .await
        .expect("harvest");
    let adapter = TranslationAdapter::new(StageId::new(), "en", ["ky"]);
    let spawned = fix
        .service
        .spawn_translator_tasks(&adapter, fix.campaign, CaseId::new())
        .await
        .expect("spawn");
    let mut translator = spawned.into_iter().next().expect("one task");

    let clock = DefaultClock;
    let mut responses = Map::new();
    responses.insert(content_hash("Full name"), json!("Толук аты"));
    responses.insert(content_hash("Age"), json!("Жашы"));
    responses.insert(content_hash("Patient intake"), json!(""));
    translator.set_responses(responses, &clock);
    translator.complete(&clock).expect("complete");

    let stored = fix
        .service
        .store_translations(&translator)
        .await
        .expect("store translations");
    assert_eq!(stored, 2);

    let rewritten = fix
        .service
        .rewrite_schema(&form_schema(), fix.campaign, "ky")
        .await
        .expect("rewrite");
    assert_eq!(rewritten["properties"]["name"]["title"], json!("Толук аты"));
    assert_eq!(rewritten["properties"]["age"]["title"], json!("Жашы"));
    // The untranslated form title stays in the source language.
    assert_eq!(rewritten["title"], json!("Patient intake"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fully_translated_campaigns_spawn_no_tasks() {
    let fix = fixture();
    let origin = StageId::new();
    fix.service
        .harvest(fix.campaign, origin, &json!({"title": "Only one"}))
        .await
        .expect("harvest");
    let adapter = TranslationAdapter::new(StageId::new(), "en", ["ky"]);
    let spawned = fix
        .service
        .spawn_translator_tasks(&adapter, fix.campaign, CaseId::new())
        .await
        .expect("spawn");
    let mut translator = spawned.into_iter().next().expect("one task");
    let clock = DefaultClock;
    let mut responses = Map::new();
    responses.insert(content_hash("Only one"), json!("Жалгыз"));
    translator.set_responses(responses, &clock);
    fix.service
        .store_translations(&translator)
        .await
        .expect("store");

    let again = fix
        .service
        .spawn_translator_tasks(&adapter, fix.campaign, CaseId::new())
        .await
        .expect("respawn");

    assert!(again.is_empty());
}
