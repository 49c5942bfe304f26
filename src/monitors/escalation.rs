use crate::core::domain::{
    Alert, AlertPriority, AlertType, EntityKind, EscalationAction, EscalationRule, StaffRole,
};
use crate::error::BoxError;
use crate::monitors::harness::Monitor;
use crate::traits::gateway::{Notification, NotificationKind};
use crate::traits::resources::{HandleProvider, TickHandles};
use crate::traits::stores::AlertQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Escalation dispatcher configuration
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Normal tick cadence
    pub interval_secs: u64,
    /// Fixed delay after a failed tick
    pub recovery_delay_secs: u64,
    /// Alerts younger than this are left alone
    pub min_age_minutes: i64,
    /// Upper bound on alerts delivered externally per sweep
    pub delivery_batch_size: usize,
    /// Alerts older than this are no longer delivered externally
    pub delivery_max_age_hours: i64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            recovery_delay_secs: 120,
            min_age_minutes: 5,
            delivery_batch_size: 10,
            delivery_max_age_hours: 24,
        }
    }
}

/// Scans unacknowledged alerts, applies escalation rules, sweeps external
/// delivery and expiry.
///
/// An alert moves Created -> escalated zero or more times -> acknowledged or
/// expired. Each tick runs three phases in order; a phase failure is logged
/// and the remaining phases still run, with the tick reporting the first
/// error so the harness backs off.
pub struct AlertEscalationDispatcher {
    config: EscalationConfig,
    resources: Arc<dyn HandleProvider>,
}

impl AlertEscalationDispatcher {
    pub fn new(config: EscalationConfig, resources: Arc<dyn HandleProvider>) -> Self {
        Self { config, resources }
    }

    /// Phase 1: apply the first matching rule to each overdue
    /// unacknowledged alert
    async fn escalate_unacknowledged(
        &self,
        handles: &TickHandles,
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let age_cutoff = now - chrono::Duration::minutes(self.config.min_age_minutes);
        let alerts = handles
            .alerts
            .query(AlertQuery {
                active_only: true,
                unacknowledged_only: true,
                created_before: Some(age_cutoff),
                ..Default::default()
            })
            .await?;
        if alerts.is_empty() {
            return Ok(());
        }

        let rules = handles.rules.enabled_rules().await?;
        if rules.is_empty() {
            debug!("no escalation rules configured");
            return Ok(());
        }

        for mut alert in alerts {
            if alert.is_expired(now) {
                continue;
            }

            let elapsed_minutes = alert.age_minutes(now);
            // a rule tier fires once per alert: it must be slower than the
            // tier recorded at the previous escalation
            let applied_delay = alert.last_escalation_delay_minutes();
            let selected = rules.iter().find(|rule| {
                rule.matches(&alert)
                    && elapsed_minutes >= rule.delay_minutes
                    && applied_delay.map_or(true, |d| rule.delay_minutes > d)
            });
            let rule = match selected {
                Some(rule) => rule,
                None => continue,
            };

            // per-alert isolation: one failed escalation never blocks the
            // rest of the scan
            match self.execute_action(handles, &alert, rule, now).await {
                Ok(()) => {
                    alert.record_escalation(now);
                    if let Err(e) = handles.alerts.update(alert.clone()).await {
                        warn!(
                            "failed to persist escalation state for alert {}: {}",
                            alert.id, e
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        "escalation of alert {} via rule '{}' failed: {}",
                        alert.id, rule.rule_name, e
                    );
                }
            }
        }

        Ok(())
    }

    async fn execute_action(
        &self,
        handles: &TickHandles,
        alert: &Alert,
        rule: &EscalationRule,
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        info!(
            "escalating alert {} via rule '{}' (age {} min)",
            alert.id,
            rule.rule_name,
            alert.age_minutes(now)
        );

        match &rule.action {
            EscalationAction::EscalateToRole { role, priority } => {
                let notification = self.escalation_notification(alert, rule, *priority);
                handles.gateway.notify_role(*role, notification).await?;
            }
            EscalationAction::EscalateToUser { user_id } => {
                let notification = self.escalation_notification(alert, rule, alert.priority);
                handles.gateway.notify_user(user_id, notification).await?;
            }
            EscalationAction::SendEmail { recipients } => {
                if recipients.is_empty() {
                    debug!("rule '{}' has no email recipients, skipping", rule.rule_name);
                    return Ok(());
                }
                let subject = format!("[{}] {}", alert.priority.as_str(), alert.title);
                for recipient in recipients {
                    if let Err(e) = handles.email.send(recipient, &subject, &alert.message).await {
                        warn!(
                            "escalation email to {} for alert {} failed: {}",
                            recipient, alert.id, e
                        );
                    }
                }
            }
            EscalationAction::SendSms { recipients } => {
                if recipients.is_empty() {
                    debug!("rule '{}' has no SMS recipients, skipping", rule.rule_name);
                    return Ok(());
                }
                let text = format!("{}: {}", alert.title, alert.message);
                for recipient in recipients {
                    if let Err(e) = handles.sms.send(recipient, &text).await {
                        warn!(
                            "escalation SMS to {} for alert {} failed: {}",
                            recipient, alert.id, e
                        );
                    }
                }
            }
            EscalationAction::CreateHighPriorityAlert => {
                let escalated = Alert::new(
                    format!("Escalated: {}", alert.title),
                    format!(
                        "Unacknowledged for {} minutes: {}",
                        alert.age_minutes(now),
                        alert.message
                    ),
                    AlertType::Escalation,
                    AlertPriority::Critical,
                    EntityKind::Alert,
                    alert.id.clone(),
                );
                handles.alerts.add(escalated.clone()).await?;
                handles.gateway.broadcast(&escalated).await?;
            }
            EscalationAction::LogCriticalEvent => {
                error!(
                    "critical unacknowledged alert {} '{}': {} (age {} min, rule '{}')",
                    alert.id,
                    alert.title,
                    alert.message,
                    alert.age_minutes(now),
                    rule.rule_name
                );
            }
        }

        Ok(())
    }

    fn escalation_notification(
        &self,
        alert: &Alert,
        rule: &EscalationRule,
        priority: AlertPriority,
    ) -> Notification {
        Notification::new(
            format!("Escalated: {}", alert.title),
            alert.message.clone(),
            NotificationKind::Escalation,
            priority,
        )
        .with_data(json!({
            "alert_id": alert.id,
            "rule": rule.rule_name,
            "escalation_count": alert.escalation_count + 1,
        }))
    }

    /// Phase 2: email recent Critical/Emergency alerts to every
    /// administrator, bounded batch, persisted once at sweep end
    async fn deliver_external(
        &self,
        handles: &TickHandles,
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let age_floor = now - chrono::Duration::hours(self.config.delivery_max_age_hours);
        let pending = handles
            .alerts
            .query(AlertQuery {
                active_only: true,
                unsent_only: true,
                min_priority: Some(AlertPriority::Critical),
                created_after: Some(age_floor),
                limit: Some(self.config.delivery_batch_size),
                ..Default::default()
            })
            .await?;
        if pending.is_empty() {
            return Ok(());
        }

        let admins = handles
            .staff
            .contacts_by_role(StaffRole::Administrator)
            .await?;
        if admins.is_empty() {
            info!("no administrative contacts configured, skipping external delivery");
            return Ok(());
        }

        let mut delivered = Vec::with_capacity(pending.len());
        for mut alert in pending {
            let subject = format!("[{}] {}", alert.priority.as_str(), alert.title);
            for contact in &admins {
                if let Err(e) = handles
                    .email
                    .send(&contact.email, &subject, &alert.message)
                    .await
                {
                    warn!(
                        "external delivery of alert {} to {} failed: {}",
                        alert.id, contact.email, e
                    );
                }
            }
            alert.mark_sent_externally();
            delivered.push(alert);
        }

        info!("delivered {} alerts externally", delivered.len());
        handles.alerts.update_many(delivered).await?;
        Ok(())
    }

    /// Phase 3: deactivate alerts past their expiry
    async fn cleanup_expired(
        &self,
        handles: &TickHandles,
        now: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let active = handles
            .alerts
            .query(AlertQuery {
                active_only: true,
                ..Default::default()
            })
            .await?;

        let expired: Vec<Alert> = active
            .into_iter()
            .filter(|alert| alert.is_expired(now))
            .map(|mut alert| {
                alert.deactivate();
                alert
            })
            .collect();
        if expired.is_empty() {
            return Ok(());
        }

        info!("deactivating {} expired alerts", expired.len());
        handles.alerts.update_many(expired).await?;
        Ok(())
    }
}

#[async_trait]
impl Monitor for AlertEscalationDispatcher {
    fn name(&self) -> &'static str {
        "escalation"
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

        // a failed phase aborts only itself; later phases still run and the
        // first error is reported for backoff
        let mut first_error: Option<BoxError> = None;

        if let Err(e) = self.escalate_unacknowledged(&handles, now).await {
            error!("escalation phase failed: {}", e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.deliver_external(&handles, now).await {
            error!("external delivery sweep failed: {}", e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.cleanup_expired(&handles, now).await {
            error!("expiry cleanup failed: {}", e);
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
