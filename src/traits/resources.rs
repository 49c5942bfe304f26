use crate::error::BoxError;
use crate::traits::channels::{EmailSender, SmsSender};
use crate::traits::gateway::NotificationGateway;
use crate::traits::stores::{
    AlertStore, EscalationRuleStore, LocationStore, OccupancySampleStore, StaffDirectory,
    VisitStore,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynVisitStore = Arc<dyn VisitStore<Error = BoxError> + Send + Sync>;
pub type DynAlertStore = Arc<dyn AlertStore<Error = BoxError> + Send + Sync>;
pub type DynLocationStore = Arc<dyn LocationStore<Error = BoxError> + Send + Sync>;
pub type DynRuleStore = Arc<dyn EscalationRuleStore<Error = BoxError> + Send + Sync>;
pub type DynSampleStore = Arc<dyn OccupancySampleStore<Error = BoxError> + Send + Sync>;
pub type DynStaffDirectory = Arc<dyn StaffDirectory<Error = BoxError> + Send + Sync>;
pub type DynGateway = Arc<dyn NotificationGateway<Error = BoxError> + Send + Sync>;
pub type DynEmailSender = Arc<dyn EmailSender<Error = BoxError> + Send + Sync>;
pub type DynSmsSender = Arc<dyn SmsSender<Error = BoxError> + Send + Sync>;

/// Store and channel handles owned by a single tick.
///
/// Acquired at tick start, used only within the tick, and released when the
/// bundle drops on any exit path.
pub struct TickHandles {
    pub visits: DynVisitStore,
    pub alerts: DynAlertStore,
    pub locations: DynLocationStore,
    pub rules: DynRuleStore,
    pub samples: DynSampleStore,
    pub staff: DynStaffDirectory,
    pub gateway: DynGateway,
    pub email: DynEmailSender,
    pub sms: DynSmsSender,
}

/// Hands out tick-scoped store/channel handles
#[async_trait]
pub trait HandleProvider: Send + Sync {
    async fn acquire(&self) -> Result<TickHandles, BoxError>;
}
