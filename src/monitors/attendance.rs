use crate::core::domain::{
    Alert, AlertPriority, AlertType, EntityKind, ScheduledVisit, StaffRole, VisitStatus,
};
use crate::error::BoxError;
use crate::monitors::harness::Monitor;
use crate::traits::gateway::{Notification, NotificationKind};
use crate::traits::resources::{HandleProvider, TickHandles};
use crate::traits::stores::AlertQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Attendance monitor configuration
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    /// Normal tick cadence
    pub interval_secs: u64,
    /// Fixed delay after a failed tick
    pub recovery_delay_secs: u64,
    /// Minutes late before a Delayed alert
    pub delay_threshold_minutes: i64,
    /// Minutes late before a No-Show alert
    pub no_show_threshold_minutes: i64,
    /// How far back the scan window reaches
    pub lookback_hours: i64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            recovery_delay_secs: 600,
            delay_threshold_minutes: 15,
            no_show_threshold_minutes: 30,
            lookback_hours: 2,
        }
    }
}

/// Scans scheduled visits and raises delay / no-show alerts.
///
/// Every tick re-derives its candidate set from the visit store, so a failed
/// tick is simply abandoned and the next one repeats the whole scan.
pub struct AttendanceMonitor {
    config: AttendanceConfig,
    resources: Arc<dyn HandleProvider>,
}

impl AttendanceMonitor {
    pub fn new(config: AttendanceConfig, resources: Arc<dyn HandleProvider>) -> Self {
        Self { config, resources }
    }

    async fn scan_visits(&self, handles: &TickHandles, now: DateTime<Utc>) -> Result<(), BoxError> {
        let window_start = now - chrono::Duration::hours(self.config.lookback_hours);
        let visits = handles.visits.visits_in_range(window_start, now).await?;
        debug!("attendance scan over {} visits", visits.len());

        for visit in visits {
            if visit.status != VisitStatus::Approved || visit.checked_in_at.is_some() {
                continue;
            }

            let minutes_late = visit.minutes_late(now);
            if minutes_late < self.config.delay_threshold_minutes {
                continue;
            }

            if minutes_late >= self.config.no_show_threshold_minutes {
                self.raise_no_show(handles, &visit, minutes_late).await?;
            } else {
                self.raise_delay(handles, &visit, minutes_late).await?;
            }
        }

        Ok(())
    }

    /// Existence check that makes alert creation idempotent per visit and
    /// category
    async fn has_alert(
        &self,
        handles: &TickHandles,
        alert_type: AlertType,
        visit_id: &str,
    ) -> Result<bool, BoxError> {
        let existing = handles
            .alerts
            .query(AlertQuery {
                alert_type: Some(alert_type),
                related_entity_type: Some(EntityKind::Visit),
                related_entity_id: Some(visit_id.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(!existing.is_empty())
    }

    async fn raise_delay(
        &self,
        handles: &TickHandles,
        visit: &ScheduledVisit,
        minutes_late: i64,
    ) -> Result<(), BoxError> {
        if self
            .has_alert(handles, AlertType::VisitorDelayed, &visit.id)
            .await?
        {
            return Ok(());
        }

        let alert = Alert::new(
            "Visitor delayed",
            format!(
                "{} is {} minutes late for their scheduled visit",
                visit.visitor_name, minutes_late
            ),
            AlertType::VisitorDelayed,
            AlertPriority::Medium,
            EntityKind::Visit,
            visit.id.clone(),
        )
        .with_target_role(StaffRole::FrontDesk);

        info!(
            "raising delay alert for visit {} ({} min late)",
            visit.id, minutes_late
        );
        handles.alerts.add(alert).await?;
        Ok(())
    }

    async fn raise_no_show(
        &self,
        handles: &TickHandles,
        visit: &ScheduledVisit,
        minutes_late: i64,
    ) -> Result<(), BoxError> {
        if self
            .has_alert(handles, AlertType::VisitorNoShow, &visit.id)
            .await?
        {
            return Ok(());
        }

        let alert = Alert::new(
            "Visitor no-show",
            format!(
                "{} has not arrived {} minutes after their scheduled start",
                visit.visitor_name, minutes_late
            ),
            AlertType::VisitorNoShow,
            AlertPriority::High,
            EntityKind::Visit,
            visit.id.clone(),
        )
        .with_target_role(StaffRole::FrontDesk);

        warn!(
            "raising no-show alert for visit {} ({} min late)",
            visit.id, minutes_late
        );
        handles.alerts.add(alert.clone()).await?;

        // host notification is best-effort; the alert record is the source
        // of truth
        let notification = Notification::new(
            alert.title.clone(),
            alert.message.clone(),
            NotificationKind::Attendance,
            alert.priority,
        )
        .with_data(json!({ "visit_id": visit.id, "minutes_late": minutes_late }));

        if let Err(e) = handles.gateway.notify_user(&visit.host_id, notification).await {
            warn!(
                "failed to notify host {} about no-show for visit {}: {}",
                visit.host_id, visit.id, e
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Monitor for AttendanceMonitor {
    fn name(&self) -> &'static str {
        "attendance"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.interval_secs)
    }

    fn recovery_delay(&self) -> Duration {
        Duration::from_secs(self.config.recovery_delay_secs)
    }

    async fn tick(&self) -> Result<(), BoxError> {
        let handles = self.resources.acquire().await?;
        self.scan_visits(&handles, Utc::now()).await
    }
}
