use crate::core::domain::{
    bucket_floor, Alert, AlertPriority, AlertType, EntityKind, Location, LocationId,
    OccupancySample, StaffRole, VisitStatus,
};
use crate::error::BoxError;
use crate::monitoring::metrics::DashboardMetrics;
use crate::monitors::harness::Monitor;
use crate::traits::gateway::{Notification, NotificationKind};
use crate::traits::resources::{HandleProvider, TickHandles};
use crate::traits::stores::AlertQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Occupancy tracker configuration
#[derive(Debug, Clone)]
pub struct OccupancyConfig {
    /// Normal tick cadence
    pub interval_secs: u64,
    /// Fixed delay after a failed tick
    pub recovery_delay_secs: u64,
    /// Width of an occupancy sample bucket
    pub bucket_minutes: i64,
    /// Only samples this fresh feed the capacity check
    pub sample_freshness_minutes: i64,
    /// Occupancy percentage at which a capacity alert is raised
    pub capacity_threshold_percent: f64,
    /// Suppression window for repeat capacity alerts per location
    pub capacity_dedup_minutes: i64,
    /// Minutes past scheduled end before a visit counts as overstayed
    pub overstay_threshold_minutes: i64,
    /// Suppression window for repeat overstay alerts per visit
    pub overstay_dedup_minutes: i64,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            recovery_delay_secs: 300,
            bucket_minutes: 5,
            sample_freshness_minutes: 10,
            capacity_threshold_percent: 90.0,
            capacity_dedup_minutes: 60,
            overstay_threshold_minutes: 60,
            overstay_dedup_minutes: 120,
        }
    }
}

/// Recomputes per-location occupancy, raises capacity and overstay alerts,
/// and publishes live dashboard metrics.
///
/// Counts are recomputed from the visit store every tick, never accumulated,
/// so restarts and missed events self-correct. The capacity dedup window is
/// deliberately shorter than the overstay window: occupancy changes fast,
/// overstays do not.
pub struct OccupancyTracker {
    config: OccupancyConfig,
    resources: Arc<dyn HandleProvider>,
    metrics: Arc<DashboardMetrics>,
}

impl OccupancyTracker {
    pub fn new(
        config: OccupancyConfig,
        resources: Arc<dyn HandleProvider>,
        metrics: Arc<DashboardMetrics>,
    ) -> Self {
        Self {
            config,
            resources,
            metrics,
        }
    }

    /// The metrics collector this tracker publishes into
    pub fn metrics(&self) -> Arc<DashboardMetrics> {
        self.metrics.clone()
    }

    /// Phase 1: recompute occupancy per active location and upsert the
    /// current bucket's sample
    async fn recompute_occupancy(
        &self,
        handles: &TickHandles,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Location>, Vec<OccupancySample>), BoxError> {
        let locations = handles.locations.active_locations().await?;
        let checked_in = handles.visits.checked_in().await?;

        let mut counts: HashMap<LocationId, u32> = HashMap::new();
        for visit in &checked_in {
            if visit.status == VisitStatus::Active && visit.is_checked_in() {
                *counts.entry(visit.location_id.clone()).or_insert(0) += 1;
            }
        }

        let bucket_start = bucket_floor(now, self.config.bucket_minutes);
        let mut samples = Vec::with_capacity(locations.len());
        for location in &locations {
            let current_count = counts.get(&location.id).copied().unwrap_or(0);
            let sample = OccupancySample::new(
                location.id.clone(),
                bucket_start,
                current_count,
                location.max_capacity,
                now,
            );
            handles.samples.upsert(sample.clone()).await?;
            samples.push(sample);
        }

        debug!(
            "recomputed occupancy for {} locations into bucket {}",
            locations.len(),
            bucket_start
        );
        Ok((locations, samples))
    }

    /// Phase 2: raise capacity alerts for locations at or above threshold
    async fn check_capacity(
        &self,
        handles: &TickHandles,
        locations: &[Location],
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let freshness_cutoff = now - chrono::Duration::minutes(self.config.sample_freshness_minutes);
        let samples = handles.samples.recent(freshness_cutoff).await?;

        for sample in samples {
            if sample.max_capacity == 0 {
                continue;
            }
            if sample.utilization_percent() < self.config.capacity_threshold_percent {
                continue;
            }

            let dedup_start = now - chrono::Duration::minutes(self.config.capacity_dedup_minutes);
            let existing = handles
                .alerts
                .query(AlertQuery {
                    alert_type: Some(AlertType::CapacityReached),
                    related_entity_type: Some(EntityKind::Location),
                    related_entity_id: Some(sample.location_id.clone()),
                    created_after: Some(dedup_start),
                    ..Default::default()
                })
                .await?;
            if !existing.is_empty() {
                continue;
            }

            let location_name = locations
                .iter()
                .find(|l| l.id == sample.location_id)
                .map(|l| l.name.as_str())
                .unwrap_or(sample.location_id.as_str());

            let alert = Alert::new(
                "Location at capacity",
                format!(
                    "{} is at {}/{} occupancy",
                    location_name, sample.current_count, sample.max_capacity
                ),
                AlertType::CapacityReached,
                AlertPriority::High,
                EntityKind::Location,
                sample.location_id.clone(),
            )
            .with_target_role(StaffRole::Security);

            warn!(
                "capacity alert for {}: {}/{}",
                location_name, sample.current_count, sample.max_capacity
            );
            handles.alerts.add(alert.clone()).await?;

            let notification = Notification::new(
                alert.title.clone(),
                alert.message.clone(),
                NotificationKind::Capacity,
                alert.priority,
            )
            .with_data(json!({
                "location_id": sample.location_id,
                "current_count": sample.current_count,
                "max_capacity": sample.max_capacity,
            }));
            if let Err(e) = handles
                .gateway
                .notify_role(StaffRole::Security, notification)
                .await
            {
                warn!(
                    "failed to notify security about capacity at {}: {}",
                    location_name, e
                );
            }
        }

        Ok(())
    }

    /// Phase 3: raise overstay alerts and notify the host
    async fn check_overstays(
        &self,
        handles: &TickHandles,
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let candidates = handles
            .visits
            .overstayed(self.config.overstay_threshold_minutes, now)
            .await?;

        for visit in candidates {
            let dedup_start = now - chrono::Duration::minutes(self.config.overstay_dedup_minutes);
            let existing = handles
                .alerts
                .query(AlertQuery {
                    alert_type: Some(AlertType::VisitorOverstay),
                    related_entity_type: Some(EntityKind::Visit),
                    related_entity_id: Some(visit.id.clone()),
                    created_after: Some(dedup_start),
                    ..Default::default()
                })
                .await?;
            if !existing.is_empty() {
                continue;
            }

            let overstay_minutes = visit.overstay_minutes(now);
            let alert = Alert::new(
                "Visitor overstay",
                format!(
                    "{} has overstayed their scheduled visit by {} minutes",
                    visit.visitor_name, overstay_minutes
                ),
                AlertType::VisitorOverstay,
                AlertPriority::Medium,
                EntityKind::Visit,
                visit.id.clone(),
            )
            .with_target_role(StaffRole::FrontDesk);

            info!(
                "overstay alert for visit {} ({} min past end)",
                visit.id, overstay_minutes
            );
            handles.alerts.add(alert.clone()).await?;

            let notification = Notification::new(
                alert.title.clone(),
                alert.message.clone(),
                NotificationKind::Overstay,
                alert.priority,
            )
            .with_data(json!({
                "visit_id": visit.id,
                "overstay_minutes": overstay_minutes,
            }));
            if let Err(e) = handles.gateway.notify_user(&visit.host_id, notification).await {
                warn!(
                    "failed to notify host {} about overstay for visit {}: {}",
                    visit.host_id, visit.id, e
                );
            }
        }

        Ok(())
    }

    /// Phase 4: publish aggregate dashboard metrics
    async fn publish_metrics(
        &self,
        handles: &TickHandles,
        samples: &[OccupancySample],
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let total_occupancy: u32 = samples.iter().map(|s| s.current_count).sum();

        let day_start = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
        let scheduled_today = handles
            .visits
            .scheduled_between(day_start, day_start + chrono::Duration::days(1))
            .await?;

        // queue depth approximated as visits already due and not yet
        // checked in
        let lookback = now - chrono::Duration::hours(2);
        let waiting = handles
            .visits
            .visits_in_range(lookback, now)
            .await?
            .iter()
            .filter(|v| {
                v.status == VisitStatus::Approved
                    && v.checked_in_at.is_none()
                    && v.scheduled_start <= now
            })
            .count();

        self.metrics
            .set_gauge("occupancy.total", total_occupancy as f64)
            .await;
        self.metrics
            .set_gauge("visits.scheduled_today", scheduled_today as f64)
            .await;
        self.metrics.set_gauge("visits.waiting", waiting as f64).await;
        self.metrics.increment_counter("occupancy.recomputes", 1).await;

        Ok(())
    }
}

#[async_trait]
impl Monitor for OccupancyTracker {
    fn name(&self) -> &'static str {
        "occupancy"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.interval_secs)
    }

    fn recovery_delay(&self) -> Duration {
        Duration::from_secs(self.config.recovery_delay_secs)
    }

    async fn tick(&self) -> Result<(), BoxError> {
        let handles = self.resources.acquire().await?;
        let now = Utc::now();

        // phases run in order; the capacity check reads the samples the
        // recompute phase just wrote
        let (locations, samples) = self.recompute_occupancy(&handles, now).await?;
        self.check_capacity(&handles, &locations, now).await?;
        self.check_overstays(&handles, now).await?;
        self.publish_metrics(&handles, &samples, now).await?;
        Ok(())
    }
}
