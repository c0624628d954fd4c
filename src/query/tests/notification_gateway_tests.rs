//! Notification gateway tests.

use super::fixtures::desk;
use crate::graph::adapters::memory::GraphBuilder;
use crate::notification::domain::{Notification, NotificationId};
use crate::notification::ports::NotificationRepository;
use crate::routing::error::EngineError;
use crate::task::domain::UserId;
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn read_notification_records_the_status_once() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("news").expect("campaign");
    let fix = desk(builder.build());

    let user = UserId::new();
    let template = Notification::template(campaign, "Welcome", "Hello!", &clock);
    let clone = template.clone_for(user, &clock);
    fix.notifications.store(&clone).await.expect("store");

    let first = fix
        .notification_api
        .read_notification(user, clone.id())
        .await
        .expect("first read");
    assert!(first.first_read);
    assert_eq!(first.notification.title(), "Welcome");

    let second = fix
        .notification_api
        .read_notification(user, clone.id())
        .await
        .expect("second read");
    assert!(!second.first_read);
    assert!(
        fix.notification_api
            .is_read(user, clone.id())
            .await
            .expect("status lookup")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reads_are_refused_for_foreign_targets_and_unknown_ids() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("news").expect("campaign");
    let fix = desk(builder.build());

    let owner = UserId::new();
    let intruder = UserId::new();
    let clone = Notification::template(campaign, "Private", "For you", &clock)
        .clone_for(owner, &clock);
    fix.notifications.store(&clone).await.expect("store");

    let refused = fix
        .notification_api
        .read_notification(intruder, clone.id())
        .await;
    assert!(matches!(refused, Err(EngineError::PermissionDenied(_))));

    let missing = fix
        .notification_api
        .read_notification(owner, NotificationId::new())
        .await;
    assert!(matches!(missing, Err(EngineError::NotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn last_task_notifications_collapse_repeated_clones() {
    let clock = DefaultClock;
    let mut builder = GraphBuilder::new();
    let (campaign, _) = builder.campaign("news").expect("campaign");
    let fix = desk(builder.build());

    let user = UserId::new();
    let template = Notification::template(campaign, "Task moved on", "Forward!", &clock);
    fix.notifications.store(&template).await.expect("store template");
    for _ in 0..3 {
        fix.notifications
            .store(&template.clone_for(user, &clock))
            .await
            .expect("store clone");
    }
    let adhoc = Notification::template(campaign, "One-off", "Hi", &clock)
        .clone_for(user, &clock);
    fix.notifications.store(&adhoc).await.expect("store ad-hoc");

    let all = fix
        .notification_api
        .list_notifications(user)
        .await
        .expect("full listing");
    assert_eq!(all.len(), 4);

    let latest = fix
        .notification_api
        .last_task_notifications(user)
        .await
        .expect("collapsed listing");
    assert_eq!(latest.len(), 2);
}
