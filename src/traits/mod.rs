pub mod channels;
pub mod gateway;
pub mod resources;
pub mod stores;

// Re-export all traits
pub use channels::{EmailSender, SmsSender};
pub use gateway::{Notification, NotificationGateway, NotificationKind};
pub use resources::{HandleProvider, TickHandles};
pub use stores::{
    AlertQuery, AlertStore, EscalationRuleStore, LocationStore, OccupancySampleStore,
    StaffDirectory, VisitStore,
};
