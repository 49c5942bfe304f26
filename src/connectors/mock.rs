use crate::core::domain::{Alert, StaffRole, UserId};
use crate::error::{BoxError, MonitorError};
use crate::traits::channels::{EmailSender, SmsSender};
use crate::traits::gateway::{Notification, NotificationGateway};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Recording implementation of NotificationGateway for tests and dry runs
#[derive(Debug)]
pub struct RecordingGateway {
    user_notifications: Arc<RwLock<Vec<(UserId, Notification)>>>,
    role_notifications: Arc<RwLock<Vec<(StaffRole, Notification)>>>,
    broadcasts: Arc<RwLock<Vec<Alert>>>,
    failing: Arc<RwLock<bool>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            user_notifications: Arc::new(RwLock::new(Vec::new())),
            role_notifications: Arc::new(RwLock::new(Vec::new())),
            broadcasts: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every gateway call fail until cleared
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn user_notifications(&self) -> Vec<(UserId, Notification)> {
        self.user_notifications.read().await.clone()
    }

    pub async fn role_notifications(&self) -> Vec<(StaffRole, Notification)> {
        self.role_notifications.read().await.clone()
    }

    pub async fn broadcasts(&self) -> Vec<Alert> {
        self.broadcasts.read().await.clone()
    }

    async fn check_failing(&self) -> Result<(), BoxError> {
        if *self.failing.read().await {
            Err(Box::new(MonitorError::store("gateway unavailable")))
        } else {
            Ok(())
        }
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    type Error = BoxError;

    async fn notify_user(
        &self,
        user_id: &str,
        notification: Notification,
    ) -> Result<(), Self::Error> {
        self.check_failing().await?;
        let mut sent = self.user_notifications.write().await;
        sent.push((user_id.to_string(), notification));
        Ok(())
    }

    async fn notify_role(
        &self,
        role: StaffRole,
        notification: Notification,
    ) -> Result<(), Self::Error> {
        self.check_failing().await?;
        let mut sent = self.role_notifications.write().await;
        sent.push((role, notification));
        Ok(())
    }

    async fn broadcast(&self, alert: &Alert) -> Result<(), Self::Error> {
        self.check_failing().await?;
        let mut broadcasts = self.broadcasts.write().await;
        broadcasts.push(alert.clone());
        Ok(())
    }
}

/// An email captured by the recording sender
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Recording implementation of EmailSender with per-address failure
/// injection
#[derive(Debug)]
pub struct RecordingEmailSender {
    sent: Arc<RwLock<Vec<SentEmail>>>,
    failing_addresses: Arc<RwLock<HashSet<String>>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            failing_addresses: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make sends to one address fail
    pub async fn fail_address(&self, address: &str) {
        let mut failing = self.failing_addresses.write().await;
        failing.insert(address.to_string());
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.read().await.clone()
    }
}

impl Default for RecordingEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    type Error = BoxError;

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Self::Error> {
        if self.failing_addresses.read().await.contains(to) {
            return Err(Box::new(MonitorError::ChannelDelivery {
                channel: "email",
                recipient: to.to_string(),
                reason: "injected failure".to_string(),
            }));
        }
        let mut sent = self.sent.write().await;
        sent.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// An SMS captured by the recording sender
#[derive(Debug, Clone, PartialEq)]
pub struct SentSms {
    pub to: String,
    pub message: String,
}

/// Recording implementation of SmsSender with per-number failure injection
#[derive(Debug)]
pub struct RecordingSmsSender {
    sent: Arc<RwLock<Vec<SentSms>>>,
    failing_numbers: Arc<RwLock<HashSet<String>>>,
}

impl RecordingSmsSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            failing_numbers: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make sends to one number fail
    pub async fn fail_number(&self, number: &str) {
        let mut failing = self.failing_numbers.write().await;
        failing.insert(number.to_string());
    }

    pub async fn sent(&self) -> Vec<SentSms> {
        self.sent.read().await.clone()
    }
}

impl Default for RecordingSmsSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    type Error = BoxError;

    async fn send(&self, to: &str, message: &str) -> Result<(), Self::Error> {
        if self.failing_numbers.read().await.contains(to) {
            return Err(Box::new(MonitorError::ChannelDelivery {
                channel: "sms",
                recipient: to.to_string(),
                reason: "injected failure".to_string(),
            }));
        }
        let mut sent = self.sent.write().await;
        sent.push(SentSms {
            to: to.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
