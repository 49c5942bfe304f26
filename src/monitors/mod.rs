pub mod attendance;
pub mod escalation;
pub mod harness;
pub mod occupancy;

pub use attendance::{AttendanceConfig, AttendanceMonitor};
pub use escalation::{AlertEscalationDispatcher, EscalationConfig};
pub use harness::{run_monitor, Monitor, MonitorSet};
pub use occupancy::{OccupancyConfig, OccupancyTracker};
