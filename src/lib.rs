pub mod connectors;
pub mod core;
pub mod error;
pub mod monitoring;
pub mod monitors;
pub mod traits;

pub use crate::core::domain::{
    Alert, AlertPriority, AlertType, EntityKind, EscalationAction, EscalationRule, Location,
    OccupancySample, ScheduledVisit, StaffContact, StaffRole, VisitStatus,
};
pub use crate::error::{BoxError, MonitorError};
pub use crate::monitoring::{DashboardMetrics, MetricSample, MetricValue};
pub use crate::monitors::{
    AlertEscalationDispatcher, AttendanceConfig, AttendanceMonitor, EscalationConfig, Monitor,
    MonitorSet, OccupancyConfig, OccupancyTracker,
};
pub use crate::traits::{
    AlertQuery, AlertStore, EmailSender, EscalationRuleStore, HandleProvider, LocationStore,
    Notification, NotificationGateway, NotificationKind, OccupancySampleStore, SmsSender,
    StaffDirectory, TickHandles, VisitStore,
};

/// Install the process-wide logger, timestamped records to stdout
pub fn init_logging() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
