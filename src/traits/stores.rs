use crate::core::domain::{
    Alert, AlertPriority, AlertType, EntityKind, EscalationRule, Location, OccupancySample,
    ScheduledVisit, StaffContact, StaffRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Predicate for selecting alerts from the platform's alert store.
///
/// Unset fields match everything; `limit` bounds the result set after
/// filtering.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub alert_type: Option<AlertType>,
    pub related_entity_type: Option<EntityKind>,
    pub related_entity_id: Option<String>,
    pub active_only: bool,
    pub unacknowledged_only: bool,
    pub unsent_only: bool,
    pub min_priority: Option<AlertPriority>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AlertQuery {
    /// Whether an alert satisfies every set field except `limit`
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(alert_type) = self.alert_type {
            if alert.alert_type != alert_type {
                return false;
            }
        }
        if let Some(entity_type) = self.related_entity_type {
            if alert.related_entity_type != entity_type {
                return false;
            }
        }
        if let Some(ref entity_id) = self.related_entity_id {
            if &alert.related_entity_id != entity_id {
                return false;
            }
        }
        if self.active_only && !alert.is_active {
            return false;
        }
        if self.unacknowledged_only && alert.is_acknowledged {
            return false;
        }
        if self.unsent_only && alert.sent_externally {
            return false;
        }
        if let Some(min_priority) = self.min_priority {
            if alert.priority < min_priority {
                return false;
            }
        }
        if let Some(created_after) = self.created_after {
            if alert.created_at < created_after {
                return false;
            }
        }
        if let Some(created_before) = self.created_before {
            if alert.created_at > created_before {
                return false;
            }
        }
        true
    }
}

/// Read access to the platform's scheduled visits
#[async_trait]
pub trait VisitStore {
    /// Error type for this store
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    /// Visits whose scheduled window overlaps [start, end]
    async fn visits_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledVisit>, Self::Error>;

    /// Active checked-in visits whose scheduled end is at least
    /// `threshold_minutes` before `now`
    async fn overstayed(
        &self,
        threshold_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledVisit>, Self::Error>;

    /// Active visits currently checked in and not checked out
    async fn checked_in(&self) -> Result<Vec<ScheduledVisit>, Self::Error>;

    /// Number of visits scheduled to start within [start, end)
    async fn scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize, Self::Error>;
}

/// Read/write access to the platform's alerts
#[async_trait]
pub trait AlertStore {
    /// Error type for this store
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    async fn query(&self, query: AlertQuery) -> Result<Vec<Alert>, Self::Error>;

    async fn add(&self, alert: Alert) -> Result<(), Self::Error>;

    async fn update(&self, alert: Alert) -> Result<(), Self::Error>;

    /// Persist a batch of updated alerts in one call
    async fn update_many(&self, alerts: Vec<Alert>) -> Result<(), Self::Error>;
}

/// Read access to facility locations
#[async_trait]
pub trait LocationStore {
    /// Error type for this store
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    async fn active_locations(&self) -> Result<Vec<Location>, Self::Error>;
}

/// Read access to escalation rules
#[async_trait]
pub trait EscalationRuleStore {
    /// Error type for this store
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    /// Enabled, active rules ordered by ascending priority number
    async fn enabled_rules(&self) -> Result<Vec<EscalationRule>, Self::Error>;
}

/// Read/write access to bucketed occupancy samples
#[async_trait]
pub trait OccupancySampleStore {
    /// Error type for this store
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    /// Insert the sample, or replace the existing row for the same
    /// (location, bucket) key
    async fn upsert(&self, sample: OccupancySample) -> Result<(), Self::Error>;

    /// Samples recorded at or after `since`
    async fn recent(&self, since: DateTime<Utc>) -> Result<Vec<OccupancySample>, Self::Error>;
}

/// Read access to staff contact details
#[async_trait]
pub trait StaffDirectory {
    /// Error type for this directory
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    async fn contacts_by_role(&self, role: StaffRole) -> Result<Vec<StaffContact>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_alert() -> Alert {
        Alert::new(
            "Visitor delayed",
            "Jane Doe is 20 minutes late",
            AlertType::VisitorDelayed,
            AlertPriority::Medium,
            EntityKind::Visit,
            "visit-1",
        )
    }

    #[test]
    fn test_default_query_matches_everything() {
        assert!(AlertQuery::default().matches(&sample_alert()));
    }

    #[test]
    fn test_query_filters() {
        let alert = sample_alert();

        let by_type = AlertQuery {
            alert_type: Some(AlertType::VisitorNoShow),
            ..Default::default()
        };
        assert!(!by_type.matches(&alert));

        let by_entity = AlertQuery {
            related_entity_type: Some(EntityKind::Visit),
            related_entity_id: Some("visit-1".to_string()),
            ..Default::default()
        };
        assert!(by_entity.matches(&alert));

        let by_priority = AlertQuery {
            min_priority: Some(AlertPriority::Critical),
            ..Default::default()
        };
        assert!(!by_priority.matches(&alert));

        let mut acked = alert.clone();
        acked.acknowledge();
        let unacked_only = AlertQuery {
            unacknowledged_only: true,
            ..Default::default()
        };
        assert!(unacked_only.matches(&alert));
        assert!(!unacked_only.matches(&acked));
    }

    #[test]
    fn test_query_time_window() {
        let alert = sample_alert();
        let window = AlertQuery {
            created_after: Some(alert.created_at - Duration::minutes(1)),
            created_before: Some(alert.created_at + Duration::minutes(1)),
            ..Default::default()
        };
        assert!(window.matches(&alert));

        let past_window = AlertQuery {
            created_before: Some(alert.created_at - Duration::minutes(5)),
            ..Default::default()
        };
        assert!(!past_window.matches(&alert));
    }
}
