use crate::core::domain::{Alert, AlertPriority, StaffRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Category tag carried on every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Attendance,
    Capacity,
    Overstay,
    Escalation,
    System,
}

/// A notification handed to the platform's fan-out gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: AlertPriority,
    /// Optional structured payload forwarded to the receiving client
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        priority: AlertPriority,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            priority,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Fan-out primitive owned by the rest of the platform.
/// This subsystem only pushes into it.
#[async_trait]
pub trait NotificationGateway {
    /// Error type for this gateway
    type Error: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static;

    /// Notify a single user
    async fn notify_user(
        &self,
        user_id: &str,
        notification: Notification,
    ) -> Result<(), Self::Error>;

    /// Notify every user holding a role
    async fn notify_role(
        &self,
        role: StaffRole,
        notification: Notification,
    ) -> Result<(), Self::Error>;

    /// Broadcast an alert to all connected clients
    async fn broadcast(&self, alert: &Alert) -> Result<(), Self::Error>;
}
