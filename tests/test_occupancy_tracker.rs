use chrono::Utc;
use std::sync::Arc;
use visitor_watch::connectors::MemoryHandleProvider;
use visitor_watch::core::domain::{
    AlertType, Location, ScheduledVisit, StaffRole, VisitStatus,
};
use visitor_watch::monitors::{OccupancyConfig, OccupancyTracker};
use visitor_watch::{DashboardMetrics, Monitor};

fn checked_in_visit(id: &str, location_id: &str, end_minutes_from_now: i64) -> ScheduledVisit {
    let now = Utc::now();
    let mut visit = ScheduledVisit::new(
        id,
        format!("visitor-{}", id),
        format!("Visitor {}", id),
        format!("host-{}", id),
        location_id,
        now - chrono::Duration::minutes(30),
        now + chrono::Duration::minutes(end_minutes_from_now),
        VisitStatus::Approved,
    );
    visit.check_in(now - chrono::Duration::minutes(25));
    visit
}

fn overstaying_visit(id: &str, location_id: &str, minutes_past_end: i64) -> ScheduledVisit {
    let now = Utc::now();
    let end = now - chrono::Duration::minutes(minutes_past_end);
    let mut visit = ScheduledVisit::new(
        id,
        format!("visitor-{}", id),
        format!("Visitor {}", id),
        format!("host-{}", id),
        location_id,
        end - chrono::Duration::minutes(60),
        end,
        VisitStatus::Approved,
    );
    visit.check_in(end - chrono::Duration::minutes(55));
    visit
}

fn tracker(provider: Arc<MemoryHandleProvider>, config: OccupancyConfig) -> OccupancyTracker {
    OccupancyTracker::new(config, provider, Arc::new(DashboardMetrics::new()))
}

#[tokio::test]
async fn test_recompute_is_idempotent_within_one_bucket() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 10))
        .await;
    provider.visits.add(checked_in_visit("v1", "lobby", 60)).await;
    provider.visits.add(checked_in_visit("v2", "lobby", 60)).await;

    // wide buckets keep both ticks in the same bucket
    let tracker = tracker(
        provider.clone(),
        OccupancyConfig {
            bucket_minutes: 240,
            ..Default::default()
        },
    );
    tracker.tick().await.unwrap();
    tracker.tick().await.unwrap();

    let samples = provider.samples.all().await;
    assert_eq!(samples.len(), 1, "one sample row per location per bucket");
    assert_eq!(samples[0].current_count, 2);
    assert_eq!(samples[0].max_capacity, 10);
}

#[tokio::test]
async fn test_lobby_at_capacity_raises_one_alert_reporting_10_of_10() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 10))
        .await;
    for i in 0..10 {
        provider
            .visits
            .add(checked_in_visit(&format!("v{}", i), "lobby", 60))
            .await;
    }

    let tracker = tracker(provider.clone(), OccupancyConfig::default());
    tracker.tick().await.unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::CapacityReached);
    assert!(
        alerts[0].message.contains("10/10"),
        "message was: {}",
        alerts[0].message
    );

    let role_notifications = provider.gateway.role_notifications().await;
    assert_eq!(role_notifications.len(), 1);
    assert_eq!(role_notifications[0].0, StaffRole::Security);

    assert_eq!(tracker.metrics().gauge("occupancy.total").await, Some(10.0));
}

#[tokio::test]
async fn test_ninety_percent_is_at_threshold() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 10))
        .await;
    for i in 0..9 {
        provider
            .visits
            .add(checked_in_visit(&format!("v{}", i), "lobby", 60))
            .await;
    }

    tracker(provider.clone(), OccupancyConfig::default())
        .tick()
        .await
        .unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1, "90% occupancy meets the 90% threshold");
}

#[tokio::test]
async fn test_below_threshold_raises_nothing() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 10))
        .await;
    for i in 0..8 {
        provider
            .visits
            .add(checked_in_visit(&format!("v{}", i), "lobby", 60))
            .await;
    }

    tracker(provider.clone(), OccupancyConfig::default())
        .tick()
        .await
        .unwrap();

    assert!(provider.alerts.all().await.is_empty());
}

#[tokio::test]
async fn test_capacity_alert_deduped_within_window_and_permitted_after() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 1))
        .await;
    provider.visits.add(checked_in_visit("v1", "lobby", 60)).await;

    let tracker = tracker(provider.clone(), OccupancyConfig::default());
    tracker.tick().await.unwrap();
    assert_eq!(provider.alerts.all().await.len(), 1);

    // five minutes later, still over threshold: suppressed by the 1-hour
    // window
    let first_id = provider.alert_ids().await[0].clone();
    provider
        .alerts
        .set_created_at(&first_id, Utc::now() - chrono::Duration::minutes(5))
        .await;
    tracker.tick().await.unwrap();
    assert_eq!(provider.alerts.all().await.len(), 1);

    // once the window closes a second alert is permitted
    provider
        .alerts
        .set_created_at(&first_id, Utc::now() - chrono::Duration::minutes(61))
        .await;
    tracker.tick().await.unwrap();
    assert_eq!(provider.alerts.all().await.len(), 2);
}

#[tokio::test]
async fn test_overstay_of_70_minutes_notifies_host_once() {
    let provider = Arc::new(MemoryHandleProvider::new());
    // scheduled 10:00-11:00, still active at 12:10
    provider.visits.add(overstaying_visit("v1", "lab", 70)).await;

    let tracker = tracker(provider.clone(), OccupancyConfig::default());
    tracker.tick().await.unwrap();

    let alerts = provider.alerts.all().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::VisitorOverstay);

    let notifications = provider.gateway.user_notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, "host-v1");
    assert!(
        notifications[0].1.message.contains("70 minutes"),
        "message was: {}",
        notifications[0].1.message
    );

    // a second tick inside the 2-hour window stays quiet
    tracker.tick().await.unwrap();
    assert_eq!(provider.alerts.all().await.len(), 1);
    assert_eq!(provider.gateway.user_notifications().await.len(), 1);
}

#[tokio::test]
async fn test_overstay_under_threshold_is_ignored() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider.visits.add(overstaying_visit("v1", "lab", 45)).await;

    tracker(provider.clone(), OccupancyConfig::default())
        .tick()
        .await
        .unwrap();

    assert!(provider.alerts.all().await.is_empty());
}

#[tokio::test]
async fn test_dashboard_metrics_published() {
    let provider = Arc::new(MemoryHandleProvider::new());
    provider
        .locations
        .add(Location::new("lobby", "Lobby", 10))
        .await;
    provider.visits.add(checked_in_visit("v1", "lobby", 60)).await;
    provider.visits.add(checked_in_visit("v2", "lobby", 60)).await;

    // one visitor due 20 minutes ago and not yet checked in
    let now = Utc::now();
    provider
        .visits
        .add(ScheduledVisit::new(
            "v3",
            "visitor-3",
            "Visitor 3",
            "host-3",
            "lobby",
            now - chrono::Duration::minutes(20),
            now + chrono::Duration::minutes(40),
            VisitStatus::Approved,
        ))
        .await;

    let tracker = tracker(provider.clone(), OccupancyConfig::default());
    tracker.tick().await.unwrap();

    let metrics = tracker.metrics();
    assert_eq!(metrics.gauge("occupancy.total").await, Some(2.0));
    assert_eq!(metrics.gauge("visits.waiting").await, Some(1.0));
    assert_eq!(metrics.counter("occupancy.recomputes").await, 1);
}
