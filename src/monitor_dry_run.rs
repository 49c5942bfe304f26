use chrono::Utc;
use log::info;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use visitor_watch::connectors::MemoryHandleProvider;
use visitor_watch::core::domain::{
    AlertPriority, AlertType, EscalationAction, EscalationRule, Location, ScheduledVisit,
    StaffContact, StaffRole, VisitStatus,
};
use visitor_watch::monitors::{
    AlertEscalationDispatcher, AttendanceConfig, AttendanceMonitor, EscalationConfig, MonitorSet,
    OccupancyConfig, OccupancyTracker,
};
use visitor_watch::{init_logging, DashboardMetrics};

/// Seed the in-memory platform with a facility worth watching: a lobby at
/// capacity, a visitor who never showed up, and one who never left.
async fn seed(provider: &MemoryHandleProvider) {
    let now = Utc::now();

    provider
        .locations
        .add(Location::new("lobby", "Lobby", 3))
        .await;
    provider
        .locations
        .add(Location::new("lab", "Research Lab", 20))
        .await;

    // three checked-in visits fill the lobby
    for i in 0..3 {
        let mut visit = ScheduledVisit::new(
            format!("visit-lobby-{}", i),
            format!("visitor-{}", i),
            format!("Visitor {}", i),
            "host-1",
            "lobby",
            now - chrono::Duration::minutes(30),
            now + chrono::Duration::minutes(30),
            VisitStatus::Approved,
        );
        visit.check_in(now - chrono::Duration::minutes(25));
        provider.visits.add(visit).await;
    }

    // a no-show, 45 minutes late
    provider
        .visits
        .add(ScheduledVisit::new(
            "visit-noshow",
            "visitor-9",
            "Casey Morgan",
            "host-2",
            "lab",
            now - chrono::Duration::minutes(45),
            now + chrono::Duration::minutes(15),
            VisitStatus::Approved,
        ))
        .await;

    // an overstay, 70 minutes past the scheduled end
    let mut overstay = ScheduledVisit::new(
        "visit-overstay",
        "visitor-8",
        "Alex Rivera",
        "host-3",
        "lab",
        now - chrono::Duration::minutes(130),
        now - chrono::Duration::minutes(70),
        VisitStatus::Approved,
    );
    overstay.check_in(now - chrono::Duration::minutes(125));
    provider.visits.add(overstay).await;

    provider
        .rules
        .add(
            EscalationRule::new(
                "raise-critical-on-no-show",
                1,
                0,
                EscalationAction::CreateHighPriorityAlert,
            )
            .for_alert_types(vec![AlertType::VisitorNoShow]),
        )
        .await;
    provider
        .rules
        .add(
            EscalationRule::new(
                "notify-security-on-stale-high",
                2,
                0,
                EscalationAction::EscalateToRole {
                    role: StaffRole::Security,
                    priority: AlertPriority::Critical,
                },
            )
            .with_min_priority(AlertPriority::High),
        )
        .await;

    provider
        .staff
        .add(StaffContact::new(
            "admin-1",
            "Dana Admin",
            StaffRole::Administrator,
            "admin@facility.example",
        ))
        .await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging()?;

    let provider = Arc::new(MemoryHandleProvider::new());
    seed(&provider).await;

    let metrics = Arc::new(DashboardMetrics::new());

    // short cadences so the dry run shows activity within seconds
    let attendance = AttendanceMonitor::new(
        AttendanceConfig {
            interval_secs: 1,
            ..Default::default()
        },
        provider.clone(),
    );
    let occupancy = OccupancyTracker::new(
        OccupancyConfig {
            interval_secs: 1,
            ..Default::default()
        },
        provider.clone(),
        metrics.clone(),
    );
    let escalation = AlertEscalationDispatcher::new(
        EscalationConfig {
            interval_secs: 1,
            min_age_minutes: 0,
            ..Default::default()
        },
        provider.clone(),
    );

    let mut set = MonitorSet::new();
    set.spawn(Arc::new(attendance));
    set.spawn(Arc::new(occupancy));
    set.spawn(Arc::new(escalation));

    info!("dry run: letting the monitors tick for a few seconds");
    sleep(Duration::from_secs(4)).await;
    set.stop().await;

    println!("\n=== Alerts raised ===");
    for alert in provider.alerts.all().await {
        println!(
            "[{}] {:?} {}: {} (escalations: {}, sent externally: {})",
            alert.priority.as_str(),
            alert.alert_type,
            alert.title,
            alert.message,
            alert.escalation_count,
            alert.sent_externally,
        );
    }

    println!("\n=== Host / role notifications ===");
    for (user, notification) in provider.gateway.user_notifications().await {
        println!("to user {}: {}", user, notification.title);
    }
    for (role, notification) in provider.gateway.role_notifications().await {
        println!("to role {:?}: {}", role, notification.title);
    }

    println!("\n=== Emails delivered ===");
    for email in provider.email.sent().await {
        println!("to {}: {}", email.to, email.subject);
    }

    println!("\n=== Dashboard metrics ===");
    for sample in metrics.snapshot().await {
        println!("{}: {:?}", sample.name, sample.value);
    }

    Ok(())
}
