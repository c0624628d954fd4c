//! Translation fan-out through the task gateway.

use super::fixtures::desk;
use crate::graph::adapters::memory::GraphBuilder;
use crate::graph::domain::TaskStageConfig;
use crate::rank::domain::{Rank, RankLimit, RankRecord};
use crate::rank::ports::RankRepository;
use crate::task::domain::UserId;
use crate::task::ports::TaskRepository;
use crate::translation::domain::TranslationAdapter;
use crate::translation::ports::TranslationRepository;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Map, json};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_creation_harvests_titles_and_spawns_translators() {
    let mut builder = GraphBuilder::new();
    let (campaign, track) = builder.campaign("outreach").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let translator_stage = builder
        .task_stage(chain, "translate", TaskStageConfig::default())
        .expect("translator stage");
    let stage = builder
        .task_stage(
            chain,
            "survey",
            TaskStageConfig {
                is_creatable: true,
                json_schema: Some(json!({
                    "type": "object",
                    "title": "Household survey",
                    "properties": {
                        "name": {"type": "string", "title": "Full name"}
                    }
                })),
                translation_adapters: vec![TranslationAdapter::new(
                    translator_stage,
                    "en",
                    ["ky", "ru"],
                )],
                ..TaskStageConfig::default()
            },
        )
        .expect("survey stage");
    let fix = desk(builder.build());

    let clock = DefaultClock;
    let user = UserId::new();
    let rank = Rank::new("enumerator", track, 0);
    fix.ranks.store_rank(&rank).await.expect("store rank");
    fix.ranks
        .store_limit(&RankLimit::new(rank.id(), stage).with_creation_open(true))
        .await
        .expect("store limit");
    fix.ranks
        .grant(RankRecord::new(user, rank.id(), &clock))
        .await
        .expect("grant");

    fix.task_api.create_task(user, stage).await.expect("creation");

    let keys = fix
        .translations
        .keys_for_campaign(campaign)
        .await
        .expect("harvested keys");
    let texts: Vec<&str> = keys.iter().map(|key| key.text()).collect();
    assert!(texts.contains(&"Household survey"));
    assert!(texts.contains(&"Full name"));

    // One translator task per target language for the single origin
    // stage batch.
    let translator_tasks = fix
        .tasks
        .tasks_by_stage(translator_stage)
        .await
        .expect("translator tasks");
    assert_eq!(translator_tasks.len(), 2);
    let schema = translator_tasks
        .first()
        .and_then(|task| task.schema_override())
        .expect("batch schema");
    let properties = schema["properties"].as_object().expect("properties");
    assert_eq!(properties.len(), 2);

    // A second creation sees no new titles and spawns nothing further.
    fix.task_api
        .create_task(user, stage)
        .await
        .expect("second creation");
    let after_repeat = fix
        .tasks
        .tasks_by_stage(translator_stage)
        .await
        .expect("translator tasks");
    assert_eq!(after_repeat.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_a_translator_task_localises_schema_reads() {
    let mut builder = GraphBuilder::new();
    let (campaign, track) = builder.campaign("outreach").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let translator_stage = builder
        .task_stage(chain, "translate", TaskStageConfig::default())
        .expect("translator stage");
    let stage = builder
        .task_stage(
            chain,
            "survey",
            TaskStageConfig {
                is_creatable: true,
                json_schema: Some(json!({
                    "type": "object",
                    "title": "Household survey",
                    "properties": {
                        "name": {"type": "string", "title": "Full name"}
                    }
                })),
                translation_adapters: vec![TranslationAdapter::new(
                    translator_stage,
                    "en",
                    ["ru"],
                )],
                ..TaskStageConfig::default()
            },
        )
        .expect("survey stage");
    let fix = desk(builder.build());

    let clock = DefaultClock;
    let user = UserId::new();
    let rank = Rank::new("enumerator", track, 0);
    fix.ranks.store_rank(&rank).await.expect("store rank");
    fix.ranks
        .store_limit(&RankLimit::new(rank.id(), stage).with_creation_open(true))
        .await
        .expect("store limit");
    fix.ranks
        .grant(RankRecord::new(user, rank.id(), &clock))
        .await
        .expect("grant");

    let survey = fix.task_api.create_task(user, stage).await.expect("creation");

    let translator = fix
        .tasks
        .tasks_by_stage(translator_stage)
        .await
        .expect("translator tasks")
        .into_iter()
        .next()
        .expect("one translator task");
    let batch = translator.schema_override().expect("batch schema");
    let properties = batch["properties"].as_object().expect("properties");
    let (hash, _) = properties
        .iter()
        .find(|(_, slot)| slot["title"] == json!("Household survey"))
        .expect("harvested title");

    let mut answers = Map::new();
    answers.insert(hash.clone(), json!("Обследование домохозяйств"));
    let receipt = fix
        .task_api
        .complete_task(Some(user), translator.id(), Some(answers))
        .await
        .expect("translator completion");
    assert!(receipt.completed);

    let localized = fix
        .task_api
        .get_task(Some(user), survey.id(), Some("ru"))
        .await
        .expect("localised read");
    let schema = localized.schema.expect("schema");
    assert_eq!(schema["title"], json!("Обследование домохозяйств"));
    // The untranslated property title stays in the source language.
    assert_eq!(schema["properties"]["name"]["title"], json!("Full name"));
}
