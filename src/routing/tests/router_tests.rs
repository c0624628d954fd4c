//! End-to-end routing tests over the in-memory engine.

use super::fixtures::engine;
use crate::fault::domain::FaultKind;
use crate::fault::ports::FaultRepository;
use crate::graph::adapters::memory::GraphBuilder;
use crate::graph::domain::{
    AssignPolicy, ConditionOp, ConditionalStageConfig, FieldType, PredicateClause,
    TaskStageConfig,
};
use crate::notification::domain::{AutoNotification, Direction, Notification};
use crate::notification::ports::NotificationRepository;
use crate::pipeline::domain::{CopyField, Integration};
use crate::task::domain::{CaseId, Task, UserId};
use crate::task::ports::TaskRepository;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Map, Value, json};

fn responses(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forward_chain_copies_assignee_from_source_stage() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("recruitment").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "apply", TaskStageConfig::default())
        .expect("entry");
    let review = builder
        .task_stage(
            chain,
            "review",
            TaskStageConfig {
                assign_user_by: AssignPolicy::Stage,
                assign_user_from_stage: Some(entry),
                ..TaskStageConfig::default()
            },
        )
        .expect("review");
    builder.edge(entry, review).expect("edge");
    let fix = engine(builder.build());

    let user = UserId::new();
    let mut applicant = Task::new(entry, CaseId::new(), &clock);
    applicant.assign(user, &clock).expect("claim");
    applicant.set_responses(responses(&[("x", json!(1))]), &clock);
    applicant.complete(&clock).expect("complete");
    fix.tasks.store(&applicant).await.expect("store");

    let report = fix.router.route(&applicant).await.expect("route");

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.assigned, report.created);
    let successors = fix
        .tasks
        .tasks_by_case_and_stage(applicant.case(), review)
        .await
        .expect("lookup");
    let successor = successors.first().expect("successor");
    assert_eq!(successor.assignee(), Some(user));
    assert_eq!(successor.in_tasks(), &[applicant.id()]);
    assert!(successor.responses().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conditional_blocks_until_predicate_holds() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("screening").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "submit", TaskStageConfig::default())
        .expect("entry");
    let gate = builder
        .conditional_stage(
            chain,
            "gate",
            ConditionalStageConfig {
                conditions: vec![PredicateClause::new(
                    "verified",
                    FieldType::String,
                    json!("yes"),
                    ConditionOp::Eq,
                )],
                ..ConditionalStageConfig::default()
            },
        )
        .expect("gate");
    let target = builder
        .task_stage(chain, "approved", TaskStageConfig::default())
        .expect("target");
    builder.edge(entry, gate).expect("edge");
    builder.edge(gate, target).expect("edge");
    let fix = engine(builder.build());

    let mut rejected = Task::new(entry, CaseId::new(), &clock);
    rejected.set_responses(responses(&[("verified", json!("no"))]), &clock);
    rejected.complete(&clock).expect("complete");
    fix.tasks.store(&rejected).await.expect("store");
    let blocked = fix.router.route(&rejected).await.expect("route");
    assert!(blocked.created.is_empty());

    let mut accepted = Task::new(entry, CaseId::new(), &clock);
    accepted.set_responses(responses(&[("verified", json!("yes"))]), &clock);
    accepted.complete(&clock).expect("complete");
    fix.tasks.store(&accepted).await.expect("store");
    let passed = fix.router.route(&accepted).await.expect("route");
    assert_eq!(passed.created.len(), 1);
    let spawned = fix
        .tasks
        .tasks_by_case_and_stage(accepted.case(), target)
        .await
        .expect("lookup");
    assert_eq!(spawned.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pingpong_returns_the_predecessor_and_keeps_its_responses() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("review loop").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let applicant_stage = builder
        .task_stage(chain, "answer", TaskStageConfig::default())
        .expect("answer");
    let returner = builder
        .conditional_stage(
            chain,
            "send back?",
            ConditionalStageConfig {
                conditions: vec![PredicateClause::new(
                    "verified",
                    FieldType::String,
                    json!("no"),
                    ConditionOp::Eq,
                )],
                pingpong: true,
                ..ConditionalStageConfig::default()
            },
        )
        .expect("returner");
    let verifier_stage = builder
        .task_stage(chain, "verify", TaskStageConfig::default())
        .expect("verify");
    builder.edge(applicant_stage, returner).expect("edge");
    builder.edge(returner, verifier_stage).expect("edge");
    let fix = engine(builder.build());

    let case = CaseId::new();
    let mut applicant = Task::new(applicant_stage, case, &clock);
    applicant.set_responses(responses(&[("answer", json!("x"))]), &clock);
    applicant.complete(&clock).expect("complete");
    fix.tasks.store(&applicant).await.expect("store");
    let first_hop = fix.router.route(&applicant).await.expect("route");
    assert_eq!(first_hop.created.len(), 1);

    // The verifier sends it back.
    let mut verifier = fix
        .tasks
        .tasks_by_case_and_stage(case, verifier_stage)
        .await
        .expect("lookup")
        .into_iter()
        .next()
        .expect("verifier task");
    verifier.set_responses(responses(&[("verified", json!("no"))]), &clock);
    verifier.complete(&clock).expect("complete");
    fix.tasks.update(&verifier).await.expect("update");
    let bounce = fix.router.route(&verifier).await.expect("route");
    assert_eq!(bounce.reopened, Some(applicant.id()));
    assert!(bounce.created.is_empty());

    let mut returned = fix
        .tasks
        .find_by_id(applicant.id())
        .await
        .expect("lookup")
        .expect("returned task");
    assert!(!returned.is_complete());
    assert!(returned.is_reopened());
    assert_eq!(returned.responses(), Some(&responses(&[("answer", json!("x"))])));
    assert_eq!(fix.tasks.tasks_by_case(case).await.expect("case").len(), 2);

    // Re-completion walks the normal path again with a fresh verifier.
    returned.complete(&clock).expect("re-complete");
    fix.tasks.update(&returned).await.expect("update");
    let resumed = fix.router.route(&returned).await.expect("route");
    assert_eq!(resumed.created.len(), 1);
    let verifiers = fix
        .tasks
        .tasks_by_case_and_stage(case, verifier_stage)
        .await
        .expect("lookup");
    assert_eq!(verifiers.len(), 2);

    // A passing verdict routes forward without another return.
    let mut second = verifiers.into_iter().last().expect("fresh verifier");
    second.set_responses(responses(&[("verified", json!("yes"))]), &clock);
    second.complete(&clock).expect("complete");
    fix.tasks.update(&second).await.expect("update");
    let verdict = fix.router.route(&second).await.expect("route");
    assert!(verdict.reopened.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn integration_groups_fan_in_by_projected_fields() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("districts").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "report", TaskStageConfig::default())
        .expect("entry");
    let rollup = builder
        .task_stage(
            chain,
            "district roll-up",
            TaskStageConfig {
                integration: Some(Integration::new(["oik"])),
                ..TaskStageConfig::default()
            },
        )
        .expect("rollup");
    builder.edge(entry, rollup).expect("edge");
    let fix = engine(builder.build());

    let case = CaseId::new();
    for oik in [4, 4, 4, 5, 5] {
        let mut report_task = Task::new(entry, case, &clock);
        report_task.set_responses(responses(&[("oik", json!(oik))]), &clock);
        report_task.complete(&clock).expect("complete");
        fix.tasks.store(&report_task).await.expect("store");
        fix.router.route(&report_task).await.expect("route");
    }

    let mut integrators = fix
        .tasks
        .tasks_by_case_and_stage(case, rollup)
        .await
        .expect("lookup");
    integrators.sort_by_key(|task| task.in_tasks().len());
    assert_eq!(integrators.len(), 2);
    assert_eq!(integrators.first().map(|task| task.in_tasks().len()), Some(2));
    assert_eq!(integrators.last().map(|task| task.in_tasks().len()), Some(3));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn copy_fields_project_case_responses_onto_new_tasks() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("intake").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let s1 = builder
        .task_stage(chain, "intake form", TaskStageConfig::default())
        .expect("s1");
    let s2 = builder
        .task_stage(chain, "triage", TaskStageConfig::default())
        .expect("s2");
    let s3 = builder
        .task_stage(
            chain,
            "contact",
            TaskStageConfig {
                copy_fields: vec![CopyField::new(s1, ["name->name", "phone->phone1"])],
                ..TaskStageConfig::default()
            },
        )
        .expect("s3");
    builder.edge(s1, s2).expect("edge");
    builder.edge(s2, s3).expect("edge");
    let fix = engine(builder.build());

    let case = CaseId::new();
    let mut intake = Task::new(s1, case, &clock);
    intake.set_responses(
        responses(&[
            ("name", json!("kloop")),
            ("phone", json!(3)),
            ("address", json!("kkkk")),
        ]),
        &clock,
    );
    intake.complete(&clock).expect("complete");
    fix.tasks.store(&intake).await.expect("store");
    fix.router.route(&intake).await.expect("route");

    let mut triage = fix
        .tasks
        .tasks_by_case_and_stage(case, s2)
        .await
        .expect("lookup")
        .into_iter()
        .next()
        .expect("triage task");
    triage.complete(&clock).expect("complete");
    fix.tasks.update(&triage).await.expect("update");
    fix.router.route(&triage).await.expect("route");

    let contact = fix
        .tasks
        .tasks_by_case_and_stage(case, s3)
        .await
        .expect("lookup")
        .into_iter()
        .next()
        .expect("contact task");
    assert_eq!(
        contact.responses(),
        Some(&responses(&[("name", json!("kloop")), ("phone1", json!(3))]))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn auto_complete_cycles_stop_at_the_hop_cap() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (error_campaign, _) = builder.error_campaign().expect("error campaign");
    let (campaign, _) = builder.campaign("relay").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "start", TaskStageConfig::default())
        .expect("entry");
    let relay = builder
        .task_stage(
            chain,
            "relay",
            TaskStageConfig {
                assign_user_by: AssignPolicy::AutoComplete,
                ..TaskStageConfig::default()
            },
        )
        .expect("relay");
    builder.edge(entry, relay).expect("edge");
    builder.edge(relay, relay).expect("edge");
    let fix = engine(builder.build());

    let mut starter = Task::new(entry, CaseId::new(), &clock);
    starter.complete(&clock).expect("complete");
    fix.tasks.store(&starter).await.expect("store");
    let report = fix.router.route(&starter).await.expect("route");

    assert_eq!(report.created.len(), report.auto_completed.len());
    let faults = fix
        .faults
        .faults_for_campaign(error_campaign)
        .await
        .expect("faults");
    assert_eq!(faults.len(), 1);
    assert_eq!(
        faults.first().map(crate::fault::domain::ErrorItem::kind),
        Some(FaultKind::RoutingDepthExceeded)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn last_one_fires_when_no_successor_is_assigned() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("closing").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "final step", TaskStageConfig::default())
        .expect("entry");
    let pool = builder
        .task_stage(chain, "pool", TaskStageConfig::default())
        .expect("pool");
    builder.edge(entry, pool).expect("edge");
    let fix = engine(builder.build());

    let template = Notification::template(campaign, "done", "chain finished", &clock);
    fix.notifications.store(&template).await.expect("template");
    fix.notifications
        .store_auto(&AutoNotification::new(
            entry,
            entry,
            Direction::LastOne,
            template.id(),
        ))
        .await
        .expect("binding");

    let user = UserId::new();
    let mut task = Task::new(entry, CaseId::new(), &clock);
    task.assign(user, &clock).expect("claim");
    task.complete(&clock).expect("complete");
    fix.tasks.store(&task).await.expect("store");
    let report = fix.router.route(&task).await.expect("route");

    // The pool successor exists but nobody holds it.
    assert_eq!(report.created.len(), 1);
    assert!(report.assigned.is_empty());
    assert_eq!(report.notifications.len(), 1);
    let inbox = fix
        .notifications
        .notifications_for_user(user)
        .await
        .expect("inbox");
    assert_eq!(inbox.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn competing_conditionals_elect_the_smallest_order() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("triage").expect("campaign");
    let chain = builder.chain(campaign, "main").expect("chain");
    let entry = builder
        .task_stage(chain, "score", TaskStageConfig::default())
        .expect("entry");
    let both_pass = |order| ConditionalStageConfig {
        conditions: vec![PredicateClause::new(
            "x",
            FieldType::Integer,
            json!(0),
            ConditionOp::Gt,
        )],
        conditional_limit_order: Some(order),
        ..ConditionalStageConfig::default()
    };
    let second = builder
        .conditional_stage(chain, "later branch", both_pass(2))
        .expect("second");
    let first = builder
        .conditional_stage(chain, "earlier branch", both_pass(1))
        .expect("first");
    let slow = builder
        .task_stage(chain, "slow lane", TaskStageConfig::default())
        .expect("slow");
    let fast = builder
        .task_stage(chain, "fast lane", TaskStageConfig::default())
        .expect("fast");
    builder.edge(entry, second).expect("edge");
    builder.edge(entry, first).expect("edge");
    builder.edge(second, slow).expect("edge");
    builder.edge(first, fast).expect("edge");
    let fix = engine(builder.build());

    let case = CaseId::new();
    let mut task = Task::new(entry, case, &clock);
    task.set_responses(responses(&[("x", json!(1))]), &clock);
    task.complete(&clock).expect("complete");
    fix.tasks.store(&task).await.expect("store");
    let report = fix.router.route(&task).await.expect("route");

    assert_eq!(report.created.len(), 1);
    let fast_tasks = fix
        .tasks
        .tasks_by_case_and_stage(case, fast)
        .await
        .expect("lookup");
    let slow_tasks = fix
        .tasks
        .tasks_by_case_and_stage(case, slow)
        .await
        .expect("lookup");
    assert_eq!(fast_tasks.len(), 1);
    assert!(slow_tasks.is_empty());
}
