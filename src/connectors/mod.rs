pub mod memory;
pub mod mock;

pub use memory::{
    MemoryAlertStore, MemoryHandleProvider, MemoryLocationStore, MemoryOccupancyStore,
    MemoryRuleStore, MemoryVisitStore, StaticStaffDirectory,
};
pub use mock::{RecordingEmailSender, RecordingGateway, RecordingSmsSender, SentEmail, SentSms};
