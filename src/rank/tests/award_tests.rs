//! Task award threshold tests.

use crate::graph::domain::{CampaignId, StageId, TrackId};
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository, domain::Notification,
    ports::NotificationRepository, services::NotificationDispatch,
};
use crate::rank::{
    adapters::memory::InMemoryRankRepository,
    domain::{Rank, TaskAward},
    ports::RankRepository,
    services::{AwardService, RankGrantService},
};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{CaseId, Task, UserId},
    ports::TaskRepository,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

type Service = AwardService<
    InMemoryRankRepository,
    InMemoryTaskRepository,
    InMemoryNotificationRepository,
    DefaultClock,
>;

struct Fixture {
    ranks: Arc<InMemoryRankRepository>,
    tasks: Arc<InMemoryTaskRepository>,
    notifications: Arc<InMemoryNotificationRepository>,
    service: Service,
    stage: StageId,
    rank: Rank,
    template: Notification,
    user: UserId,
}

async fn fixture(count: u32) -> Fixture {
    let clock = Arc::new(DefaultClock);
    let ranks = Arc::new(InMemoryRankRepository::new());
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());

    let stage = StageId::new();
    let rank = Rank::new("awarded", TrackId::new(), 2);
    ranks.store_rank(&rank).await.expect("store rank");
    let template =
        Notification::template(CampaignId::new(), "awarded", "you levelled up", &*clock);
    notifications.store(&template).await.expect("store template");
    // Completion and verified stage coincide, as in the simplest award
    // setups.
    let award =
        TaskAward::new(stage, stage, rank.id(), count).with_notification(template.id());
    ranks.store_award(&award).await.expect("store award");

    let service = AwardService::new(
        Arc::clone(&ranks),
        Arc::clone(&tasks),
        RankGrantService::new(Arc::clone(&ranks), Arc::clone(&clock)),
        NotificationDispatch::new(Arc::clone(&notifications), Arc::clone(&clock)),
    );
    Fixture {
        ranks,
        tasks,
        notifications,
        service,
        stage,
        rank,
        template,
        user: UserId::new(),
    }
}

async fn complete_one(fix: &Fixture, forced: bool) -> Task {
    let clock = DefaultClock;
    let mut task = Task::new(fix.stage, CaseId::new(), &clock);
    task.assign(fix.user, &clock).expect("claim");
    if forced {
        task.complete_forced(&clock).expect("forced completion");
    } else {
        task.complete(&clock).expect("completion");
    }
    fix.tasks.store(&task).await.expect("store");
    task
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn award_fires_exactly_once_at_threshold() {
    let fix = fixture(5).await;

    for _ in 0..4 {
        let task = complete_one(&fix, false).await;
        let stop = fix
            .service
            .on_verified_completion(&task)
            .await
            .expect("award check");
        assert!(!stop);
        assert!(!fix
            .ranks
            .has_rank(fix.user, fix.rank.id())
            .await
            .expect("membership"));
    }

    let fifth = complete_one(&fix, false).await;
    fix.service
        .on_verified_completion(&fifth)
        .await
        .expect("fifth check");
    assert!(fix
        .ranks
        .has_rank(fix.user, fix.rank.id())
        .await
        .expect("membership"));
    let inbox = fix
        .notifications
        .notifications_for_user(fix.user)
        .await
        .expect("inbox");
    assert_eq!(inbox.len(), 1);

    // A sixth completion adds neither a record nor a notification.
    let sixth = complete_one(&fix, false).await;
    fix.service
        .on_verified_completion(&sixth)
        .await
        .expect("sixth check");
    let inbox_after = fix
        .notifications
        .notifications_for_user(fix.user)
        .await
        .expect("inbox after");
    assert_eq!(inbox_after.len(), 1);
    assert_eq!(
        inbox_after.first().map(|n| n.source()),
        Some(Some(fix.template.id()))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forced_completions_do_not_feed_thresholds() {
    let fix = fixture(1).await;

    let forced = complete_one(&fix, true).await;
    fix.service
        .on_verified_completion(&forced)
        .await
        .expect("forced check");
    assert!(!fix
        .ranks
        .has_rank(fix.user, fix.rank.id())
        .await
        .expect("membership"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_chain_reports_suppression() {
    let clock = Arc::new(DefaultClock);
    let ranks = Arc::new(InMemoryRankRepository::new());
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let stage = StageId::new();
    let rank = Rank::new("awarded", TrackId::new(), 2);
    ranks.store_rank(&rank).await.expect("store rank");
    ranks
        .store_award(&TaskAward::new(stage, stage, rank.id(), 1).with_stop_chain(true))
        .await
        .expect("store award");
    let service: Service = AwardService::new(
        Arc::clone(&ranks),
        Arc::clone(&tasks),
        RankGrantService::new(Arc::clone(&ranks), Arc::clone(&clock)),
        NotificationDispatch::new(Arc::clone(&notifications), Arc::clone(&clock)),
    );

    let user = UserId::new();
    let sys_clock = DefaultClock;
    let mut task = Task::new(stage, CaseId::new(), &sys_clock);
    task.assign(user, &sys_clock).expect("claim");
    task.complete(&sys_clock).expect("complete");
    tasks.store(&task).await.expect("store");

    let stop = service
        .on_verified_completion(&task)
        .await
        .expect("award check");
    assert!(stop);
}
