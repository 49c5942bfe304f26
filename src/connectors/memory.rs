use crate::connectors::mock::{RecordingEmailSender, RecordingGateway, RecordingSmsSender};
use crate::core::domain::{
    Alert, AlertId, EscalationRule, Location, OccupancySample, ScheduledVisit, StaffContact,
    StaffRole,
};
use crate::error::{BoxError, MonitorError};
use crate::traits::resources::{HandleProvider, TickHandles};
use crate::traits::stores::{
    AlertQuery, AlertStore, EscalationRuleStore, LocationStore, OccupancySampleStore,
    StaffDirectory, VisitStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of VisitStore for tests and dry runs
#[derive(Debug)]
pub struct MemoryVisitStore {
    visits: Arc<RwLock<Vec<ScheduledVisit>>>,
}

impl MemoryVisitStore {
    pub fn new() -> Self {
        Self {
            visits: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add(&self, visit: ScheduledVisit) {
        let mut visits = self.visits.write().await;
        visits.push(visit);
    }

    pub async fn all(&self) -> Vec<ScheduledVisit> {
        self.visits.read().await.clone()
    }
}

impl Default for MemoryVisitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisitStore for MemoryVisitStore {
    type Error = BoxError;

    async fn visits_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledVisit>, Self::Error> {
        let visits = self.visits.read().await;
        Ok(visits
            .iter()
            .filter(|v| v.scheduled_start <= end && v.scheduled_end >= start)
            .cloned()
            .collect())
    }

    async fn overstayed(
        &self,
        threshold_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledVisit>, Self::Error> {
        let cutoff = now - chrono::Duration::minutes(threshold_minutes);
        let visits = self.visits.read().await;
        Ok(visits
            .iter()
            .filter(|v| v.is_checked_in() && v.scheduled_end <= cutoff)
            .cloned()
            .collect())
    }

    async fn checked_in(&self) -> Result<Vec<ScheduledVisit>, Self::Error> {
        let visits = self.visits.read().await;
        Ok(visits.iter().filter(|v| v.is_checked_in()).cloned().collect())
    }

    async fn scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize, Self::Error> {
        let visits = self.visits.read().await;
        Ok(visits
            .iter()
            .filter(|v| v.scheduled_start >= start && v.scheduled_start < end)
            .count())
    }
}

/// In-memory implementation of AlertStore for tests and dry runs
#[derive(Debug)]
pub struct MemoryAlertStore {
    alerts: Arc<RwLock<Vec<Alert>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self {
            alerts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn all(&self) -> Vec<Alert> {
        self.alerts.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        let alerts = self.alerts.read().await;
        alerts.iter().find(|a| a.id == id).cloned()
    }

    /// Rewrite an alert's creation time; lets tests age alerts past dedup
    /// and escalation windows
    pub async fn set_created_at(&self, id: &str, created_at: DateTime<Utc>) {
        let mut alerts = self.alerts.write().await;
        if let Some(alert) = alerts.iter_mut().find(|a| a.id == id) {
            alert.created_at = created_at;
        }
    }

    pub async fn acknowledge(&self, id: &str) {
        let mut alerts = self.alerts.write().await;
        if let Some(alert) = alerts.iter_mut().find(|a| a.id == id) {
            alert.acknowledge();
        }
    }
}

impl Default for MemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    type Error = BoxError;

    async fn query(&self, query: AlertQuery) -> Result<Vec<Alert>, Self::Error> {
        let alerts = self.alerts.read().await;
        let mut matched: Vec<Alert> = alerts.iter().filter(|a| query.matches(a)).cloned().collect();
        matched.sort_by_key(|a| a.created_at);
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn add(&self, alert: Alert) -> Result<(), Self::Error> {
        let mut alerts = self.alerts.write().await;
        alerts.push(alert);
        Ok(())
    }

    async fn update(&self, alert: Alert) -> Result<(), Self::Error> {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(existing) => {
                *existing = alert;
                Ok(())
            }
            None => Err(Box::new(MonitorError::store(format!(
                "alert {} not found",
                alert.id
            ))) as BoxError),
        }
    }

    async fn update_many(&self, updated: Vec<Alert>) -> Result<(), Self::Error> {
        let mut alerts = self.alerts.write().await;
        for alert in updated {
            match alerts.iter_mut().find(|a| a.id == alert.id) {
                Some(existing) => *existing = alert,
                None => {
                    return Err(Box::new(MonitorError::store(format!(
                        "alert {} not found",
                        alert.id
                    ))) as BoxError)
                }
            }
        }
        Ok(())
    }
}

/// In-memory implementation of LocationStore
#[derive(Debug)]
pub struct MemoryLocationStore {
    locations: Arc<RwLock<Vec<Location>>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self {
            locations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add(&self, location: Location) {
        let mut locations = self.locations.write().await;
        locations.push(location);
    }
}

impl Default for MemoryLocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    type Error = BoxError;

    async fn active_locations(&self) -> Result<Vec<Location>, Self::Error> {
        Ok(self.locations.read().await.clone())
    }
}

/// In-memory implementation of EscalationRuleStore
#[derive(Debug)]
pub struct MemoryRuleStore {
    rules: Arc<RwLock<Vec<EscalationRule>>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add(&self, rule: EscalationRule) {
        let mut rules = self.rules.write().await;
        rules.push(rule);
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EscalationRuleStore for MemoryRuleStore {
    type Error = BoxError;

    async fn enabled_rules(&self) -> Result<Vec<EscalationRule>, Self::Error> {
        let rules = self.rules.read().await;
        let mut enabled: Vec<EscalationRule> = rules
            .iter()
            .filter(|r| r.enabled && r.active)
            .cloned()
            .collect();
        enabled.sort_by_key(|r| r.priority);
        Ok(enabled)
    }
}

/// In-memory implementation of OccupancySampleStore keyed on
/// (location, bucket)
#[derive(Debug)]
pub struct MemoryOccupancyStore {
    samples: Arc<RwLock<Vec<OccupancySample>>>,
}

impl MemoryOccupancyStore {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn all(&self) -> Vec<OccupancySample> {
        self.samples.read().await.clone()
    }
}

impl Default for MemoryOccupancyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OccupancySampleStore for MemoryOccupancyStore {
    type Error = BoxError;

    async fn upsert(&self, sample: OccupancySample) -> Result<(), Self::Error> {
        let mut samples = self.samples.write().await;
        match samples
            .iter_mut()
            .find(|s| s.location_id == sample.location_id && s.bucket_start == sample.bucket_start)
        {
            Some(existing) => *existing = sample,
            None => samples.push(sample),
        }
        Ok(())
    }

    async fn recent(&self, since: DateTime<Utc>) -> Result<Vec<OccupancySample>, Self::Error> {
        let samples = self.samples.read().await;
        Ok(samples
            .iter()
            .filter(|s| s.recorded_at >= since)
            .cloned()
            .collect())
    }
}

/// Fixed staff directory for tests and dry runs
#[derive(Debug)]
pub struct StaticStaffDirectory {
    contacts: Arc<RwLock<Vec<StaffContact>>>,
}

impl StaticStaffDirectory {
    pub fn new() -> Self {
        Self {
            contacts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add(&self, contact: StaffContact) {
        let mut contacts = self.contacts.write().await;
        contacts.push(contact);
    }
}

impl Default for StaticStaffDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StaffDirectory for StaticStaffDirectory {
    type Error = BoxError;

    async fn contacts_by_role(&self, role: StaffRole) -> Result<Vec<StaffContact>, Self::Error> {
        let contacts = self.contacts.read().await;
        Ok(contacts.iter().filter(|c| c.role == role).cloned().collect())
    }
}

/// Hands out tick handles backed by the in-memory stores and recording
/// channels.
///
/// Fields are public so tests can seed stores and inspect recorded calls
/// directly.
pub struct MemoryHandleProvider {
    pub visits: Arc<MemoryVisitStore>,
    pub alerts: Arc<MemoryAlertStore>,
    pub locations: Arc<MemoryLocationStore>,
    pub rules: Arc<MemoryRuleStore>,
    pub samples: Arc<MemoryOccupancyStore>,
    pub staff: Arc<StaticStaffDirectory>,
    pub gateway: Arc<RecordingGateway>,
    pub email: Arc<RecordingEmailSender>,
    pub sms: Arc<RecordingSmsSender>,
}

impl MemoryHandleProvider {
    pub fn new() -> Self {
        Self {
            visits: Arc::new(MemoryVisitStore::new()),
            alerts: Arc::new(MemoryAlertStore::new()),
            locations: Arc::new(MemoryLocationStore::new()),
            rules: Arc::new(MemoryRuleStore::new()),
            samples: Arc::new(MemoryOccupancyStore::new()),
            staff: Arc::new(StaticStaffDirectory::new()),
            gateway: Arc::new(RecordingGateway::new()),
            email: Arc::new(RecordingEmailSender::new()),
            sms: Arc::new(RecordingSmsSender::new()),
        }
    }

    /// Ids of all stored alerts, in insertion order
    pub async fn alert_ids(&self) -> Vec<AlertId> {
        self.alerts.all().await.into_iter().map(|a| a.id).collect()
    }
}

impl Default for MemoryHandleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HandleProvider for MemoryHandleProvider {
    async fn acquire(&self) -> Result<TickHandles, BoxError> {
        Ok(TickHandles {
            visits: self.visits.clone(),
            alerts: self.alerts.clone(),
            locations: self.locations.clone(),
            rules: self.rules.clone(),
            samples: self.samples.clone(),
            staff: self.staff.clone(),
            gateway: self.gateway.clone(),
            email: self.email.clone(),
            sms: self.sms.clone(),
        })
    }
}
