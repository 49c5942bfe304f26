use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert identifier
pub type AlertId = String;

/// Scheduled visit identifier
pub type VisitId = String;

/// Location identifier
pub type LocationId = String;

/// Platform user identifier
pub type UserId = String;

/// Alert priority, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
    Emergency,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "Low",
            AlertPriority::Medium => "Medium",
            AlertPriority::High => "High",
            AlertPriority::Critical => "Critical",
            AlertPriority::Emergency => "Emergency",
        }
    }
}

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    VisitorDelayed,
    VisitorNoShow,
    CapacityReached,
    VisitorOverstay,
    Escalation,
    System,
}

/// Kind of record an alert refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Visit,
    Location,
    Alert,
    System,
}

/// Staff role used for targeted notification fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Administrator,
    Security,
    FrontDesk,
    Facilities,
}

/// An alert raised by one of the monitors or synthesized by escalation.
///
/// Acknowledgment and external-delivery state only move from false to true,
/// and a deactivated alert never becomes active again; callers go through
/// the transition methods rather than flipping fields back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_acknowledged: bool,
    pub is_active: bool,
    pub sent_externally: bool,
    pub related_entity_type: EntityKind,
    pub related_entity_id: String,
    pub target_role: Option<StaffRole>,
    pub escalation_count: u32,
    pub last_escalated_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Create a new active, unacknowledged alert
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        alert_type: AlertType,
        priority: AlertPriority,
        related_entity_type: EntityKind,
        related_entity_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            alert_type,
            priority,
            created_at: Utc::now(),
            expires_at: None,
            is_acknowledged: false,
            is_active: true,
            sent_externally: false,
            related_entity_type,
            related_entity_id: related_entity_id.into(),
            target_role: None,
            escalation_count: 0,
            last_escalated_at: None,
        }
    }

    /// Set an absolute expiry time
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Target a staff role for fan-out
    pub fn with_target_role(mut self, role: StaffRole) -> Self {
        self.target_role = Some(role);
        self
    }

    /// Mark the alert acknowledged. Monotonic.
    pub fn acknowledge(&mut self) {
        self.is_acknowledged = true;
    }

    /// Mark the alert delivered through an external channel. Monotonic.
    pub fn mark_sent_externally(&mut self) {
        self.sent_externally = true;
    }

    /// Terminally deactivate the alert
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Record an applied escalation
    pub fn record_escalation(&mut self, at: DateTime<Utc>) {
        self.escalation_count += 1;
        self.last_escalated_at = Some(at);
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Whole minutes since creation
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_minutes()
    }

    /// Alert age, in whole minutes, at the time of the last escalation
    pub fn last_escalation_delay_minutes(&self) -> Option<i64> {
        self.last_escalated_at
            .map(|at| (at - self.created_at).num_minutes())
    }
}

/// Action an escalation rule executes when it fires.
///
/// The action set is closed and matched exhaustively by the dispatcher; each
/// variant carries its own target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EscalationAction {
    EscalateToRole {
        role: StaffRole,
        priority: AlertPriority,
    },
    EscalateToUser {
        user_id: UserId,
    },
    SendEmail {
        recipients: Vec<String>,
    },
    SendSms {
        recipients: Vec<String>,
    },
    CreateHighPriorityAlert,
    LogCriticalEvent,
}

/// Policy mapping an alert's characteristics and age to an action.
///
/// Among the enabled rules matching one alert in one scan, only the rule
/// with the lowest `priority` number fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRule {
    pub rule_name: String,
    pub priority: u32,
    /// Alert types the rule applies to; empty matches any type
    pub alert_types: Vec<AlertType>,
    /// Minimum alert priority, inclusive
    pub min_priority: Option<AlertPriority>,
    /// Restrict to alerts about one kind of entity
    pub entity_kind: Option<EntityKind>,
    /// Minimum unacknowledged age before the rule fires
    pub delay_minutes: i64,
    pub action: EscalationAction,
    pub enabled: bool,
    pub active: bool,
}

impl EscalationRule {
    pub fn new(
        rule_name: impl Into<String>,
        priority: u32,
        delay_minutes: i64,
        action: EscalationAction,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            priority,
            alert_types: Vec::new(),
            min_priority: None,
            entity_kind: None,
            delay_minutes,
            action,
            enabled: true,
            active: true,
        }
    }

    /// Restrict the rule to specific alert types
    pub fn for_alert_types(mut self, alert_types: Vec<AlertType>) -> Self {
        self.alert_types = alert_types;
        self
    }

    /// Require a minimum alert priority
    pub fn with_min_priority(mut self, min_priority: AlertPriority) -> Self {
        self.min_priority = Some(min_priority);
        self
    }

    /// Restrict the rule to alerts about one kind of entity
    pub fn for_entity_kind(mut self, entity_kind: EntityKind) -> Self {
        self.entity_kind = Some(entity_kind);
        self
    }

    /// Whether the rule's predicate matches the alert's type, priority and
    /// related entity. Age eligibility is checked separately.
    pub fn matches(&self, alert: &Alert) -> bool {
        if !self.alert_types.is_empty() && !self.alert_types.contains(&alert.alert_type) {
            return false;
        }
        if let Some(min_priority) = self.min_priority {
            if alert.priority < min_priority {
                return false;
            }
        }
        if let Some(entity_kind) = self.entity_kind {
            if alert.related_entity_type != entity_kind {
                return false;
            }
        }
        true
    }
}

/// A recomputed occupancy reading for one location and one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySample {
    pub location_id: LocationId,
    pub bucket_start: DateTime<Utc>,
    pub current_count: u32,
    pub max_capacity: u32,
    pub recorded_at: DateTime<Utc>,
}

impl OccupancySample {
    pub fn new(
        location_id: impl Into<String>,
        bucket_start: DateTime<Utc>,
        current_count: u32,
        max_capacity: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            bucket_start,
            current_count,
            max_capacity,
            recorded_at,
        }
    }

    /// Occupancy as a percentage of capacity; zero-capacity locations read 0
    pub fn utilization_percent(&self) -> f64 {
        if self.max_capacity == 0 {
            return 0.0;
        }
        self.current_count as f64 / self.max_capacity as f64 * 100.0
    }
}

/// Floor a timestamp to the start of its bucket
pub fn bucket_floor(ts: DateTime<Utc>, width_minutes: i64) -> DateTime<Utc> {
    let width_secs = width_minutes * 60;
    if width_secs <= 0 {
        return ts;
    }
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(width_secs);
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(ts)
}

/// Visit lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitStatus {
    Pending,
    Approved,
    Active,
    Completed,
    Cancelled,
}

/// A scheduled visit, owned by the platform's visit service; this subsystem
/// only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledVisit {
    pub id: VisitId,
    pub visitor_id: UserId,
    pub visitor_name: String,
    pub host_id: UserId,
    pub location_id: LocationId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: VisitStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl ScheduledVisit {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        visitor_id: impl Into<String>,
        visitor_name: impl Into<String>,
        host_id: impl Into<String>,
        location_id: impl Into<String>,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
        status: VisitStatus,
    ) -> Self {
        Self {
            id: id.into(),
            visitor_id: visitor_id.into(),
            visitor_name: visitor_name.into(),
            host_id: host_id.into(),
            location_id: location_id.into(),
            scheduled_start,
            scheduled_end,
            status,
            checked_in_at: None,
            checked_out_at: None,
        }
    }

    /// Record arrival and activate the visit
    pub fn check_in(&mut self, at: DateTime<Utc>) {
        self.checked_in_at = Some(at);
        self.status = VisitStatus::Active;
    }

    /// Record departure and complete the visit
    pub fn check_out(&mut self, at: DateTime<Utc>) {
        self.checked_out_at = Some(at);
        self.status = VisitStatus::Completed;
    }

    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some() && self.checked_out_at.is_none()
    }

    /// Whole minutes past the scheduled start; negative when not yet due
    pub fn minutes_late(&self, now: DateTime<Utc>) -> i64 {
        (now - self.scheduled_start).num_minutes()
    }

    /// Whole minutes past the scheduled end; negative while still in window
    pub fn overstay_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.scheduled_end).num_minutes()
    }
}

/// A facility location with a hard capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub max_capacity: u32,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_capacity,
        }
    }
}

/// Read-only projection of a platform user, used for channel delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffContact {
    pub user_id: UserId,
    pub name: String,
    pub role: StaffRole,
    pub email: String,
    pub phone: Option<String>,
}

impl StaffContact {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        role: StaffRole,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
            email: email.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_priority_ordering() {
        assert!(AlertPriority::Low < AlertPriority::Medium);
        assert!(AlertPriority::Critical < AlertPriority::Emergency);
        assert!(AlertPriority::Emergency >= AlertPriority::Critical);
    }

    #[test]
    fn test_alert_transitions_are_monotonic() {
        let mut alert = Alert::new(
            "Visitor no-show",
            "Jane Doe has not arrived",
            AlertType::VisitorNoShow,
            AlertPriority::High,
            EntityKind::Visit,
            "visit-1",
        );
        assert!(alert.is_active);
        assert!(!alert.is_acknowledged);
        assert!(!alert.sent_externally);

        alert.acknowledge();
        alert.mark_sent_externally();
        alert.deactivate();
        assert!(alert.is_acknowledged);
        assert!(alert.sent_externally);
        assert!(!alert.is_active);
    }

    #[test]
    fn test_alert_expiry() {
        let now = Utc::now();
        let alert = Alert::new(
            "t",
            "m",
            AlertType::System,
            AlertPriority::Low,
            EntityKind::System,
            "sys",
        )
        .with_expiry(now + Duration::minutes(10));
        assert!(!alert.is_expired(now));
        assert!(alert.is_expired(now + Duration::minutes(10)));
        assert!(alert.is_expired(now + Duration::hours(1)));
    }

    #[test]
    fn test_rule_matching() {
        let alert = Alert::new(
            "Location at capacity",
            "Lobby is full",
            AlertType::CapacityReached,
            AlertPriority::High,
            EntityKind::Location,
            "loc-1",
        );

        let any = EscalationRule::new("any", 1, 10, EscalationAction::LogCriticalEvent);
        assert!(any.matches(&alert));

        let typed = EscalationRule::new("typed", 1, 10, EscalationAction::LogCriticalEvent)
            .for_alert_types(vec![AlertType::VisitorNoShow]);
        assert!(!typed.matches(&alert));

        let prioritized = EscalationRule::new("prio", 1, 10, EscalationAction::LogCriticalEvent)
            .with_min_priority(AlertPriority::Critical);
        assert!(!prioritized.matches(&alert));

        let scoped = EscalationRule::new("scoped", 1, 10, EscalationAction::LogCriticalEvent)
            .for_entity_kind(EntityKind::Location)
            .with_min_priority(AlertPriority::High);
        assert!(scoped.matches(&alert));
    }

    #[test]
    fn test_bucket_floor() {
        let ts = DateTime::parse_from_rfc3339("2026-03-04T10:07:31Z")
            .unwrap()
            .with_timezone(&Utc);
        let bucket = bucket_floor(ts, 5);
        assert_eq!(bucket.to_rfc3339(), "2026-03-04T10:05:00+00:00");

        // already on the boundary
        assert_eq!(bucket_floor(bucket, 5), bucket);
    }

    #[test]
    fn test_visit_lateness() {
        let now = Utc::now();
        let visit = ScheduledVisit::new(
            "v1",
            "visitor-1",
            "Jane Doe",
            "host-1",
            "loc-1",
            now - Duration::minutes(20),
            now + Duration::minutes(40),
            VisitStatus::Approved,
        );
        assert_eq!(visit.minutes_late(now), 20);
        assert!(!visit.is_checked_in());
        assert!(visit.overstay_minutes(now) < 0);
    }

    #[test]
    fn test_utilization() {
        let now = Utc::now();
        let sample = OccupancySample::new("loc-1", bucket_floor(now, 5), 9, 10, now);
        assert_eq!(sample.utilization_percent(), 90.0);

        let empty = OccupancySample::new("loc-2", bucket_floor(now, 5), 3, 0, now);
        assert_eq!(empty.utilization_percent(), 0.0);
    }
}
