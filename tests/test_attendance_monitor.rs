use chrono::Utc;
use std::sync::Arc;
use visitor_watch::connectors::MemoryHandleProvider;
use visitor_watch::core::domain::{
    Alert, AlertPriority, AlertType, EntityKind, ScheduledVisit, VisitStatus,
};
use visitor_watch::monitors::{AttendanceConfig, AttendanceMonitor};
use visitor_watch::{AlertStore, Monitor};

fn visit_starting_minutes_ago(id: &str, minutes_ago: i64) -> ScheduledVisit {
    let now = Utc::now();
    let start = now - chrono::Duration::minutes(minutes_ago);
    ScheduledVisit::new(
        id,
        "visitor-1",
        "Jane Doe",
        "host-1",
        "lobby",
        start,
        start + chrono::Duration::minutes(60),
        VisitStatus::Approved,
    )
}

fn monitor(provider: Arc<MemoryHandleProvider>) -> AttendanceMonitor {
    AttendanceMonitor::new(AttendanceConfig::default(), provider)
}

#[tokio::test]
async fn test_fourteen_minutes_late_raises_nothing() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .visits
        .add(visit_starting_minutes_ago("v1", 14))
        .await;

    monitor(provider.clone()).tick().await.unwrap();

    assert!(provider.alerts.all().await.is_empty());
}

#[tokio::test]
async fn test_fifteen_minutes_late_raises_one_delayed_alert() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .visits
        .add(visit_starting_minutes_ago("v1", 15))
        .await;

    monitor(provider.clone()).tick().await.unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::VisitorDelayed);
    assert_eq!(alerts[0].priority, AlertPriority::Medium);
    assert_eq!(alerts[0].related_entity_id, "v1");
}

#[tokio::test]
async fn test_thirty_minutes_late_raises_no_show_and_notifies_host() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .visits
        .add(visit_starting_minutes_ago("v1", 30))
        .await;

    monitor(provider.clone()).tick().await.unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::VisitorNoShow);
    assert_eq!(alerts[0].priority, AlertPriority::High);

    let notifications = provider.gateway.user_notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, "host-1");
}

#[tokio::test]
async fn test_no_show_does_not_add_delayed_when_one_already_exists() {
    let provider = Arc::new(MemoryHandleProvider::new());
    let visit = visit_starting_minutes_ago("v1", 35);

    // a Delayed alert was raised on an earlier tick, before the visit
    // crossed the no-show threshold
    provider
        .alerts
        .add(Alert::new(
            "Visitor delayed",
            "Jane Doe is 16 minutes late for their scheduled visit",
            AlertType::VisitorDelayed,
            AlertPriority::Medium,
            EntityKind::Visit,
            visit.id.clone(),
        ))
        .await
        .unwrap();
    provider.visits.add(visit).await;

    let monitor = monitor(provider.clone());
    monitor.tick().await.unwrap();
    monitor.tick().await.unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 2);
    let delayed = alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::VisitorDelayed)
        .count();
    let no_shows = alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::VisitorNoShow)
        .count();
    assert_eq!(delayed, 1, "no second Delayed alert after no-show");
    assert_eq!(no_shows, 1);
}

#[tokio::test]
async fn test_three_ticks_yield_exactly_one_no_show_alert() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .visits
        .add(visit_starting_minutes_ago("v1", 45))
        .await;

    let monitor = monitor(provider.clone());
    for _ in 0..3 {
        monitor.tick().await.unwrap();
    }

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::VisitorNoShow);
}

#[tokio::test]
async fn test_checked_in_visit_is_skipped() {
    let provider = Arc::new(MemoryHandleProvider::new());
    let mut visit = visit_starting_minutes_ago("v1", 40);
    visit.check_in(Utc::now() - chrono::Duration::minutes(35));
    provider.visits.add(visit).await;

    monitor(provider.clone()).tick().await.unwrap();

    assert!(provider.alerts.all().await.is_empty());
}

#[tokio::test]
async fn test_visit_not_yet_due_is_skipped() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .visits
        .add(visit_starting_minutes_ago("v1", -10))
        .await;

    monitor(provider.clone()).tick().await.unwrap();

    assert!(provider.alerts.all().await.is_empty());
}

#[tokio::test]
async fn test_unapproved_visit_is_skipped() {
    let provider = Arc::new(MemoryHandleProvider::new());
    let mut visit = visit_starting_minutes_ago("v1", 40);
    visit.status = VisitStatus::Pending;
    provider.visits.add(visit).await;

    monitor(provider.clone()).tick().await.unwrap();

    assert!(provider.alerts.all().await.is_empty());
}
