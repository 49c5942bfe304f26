/// Dashboard metric publication
pub mod metrics;

pub use metrics::{DashboardMetrics, MetricSample, MetricValue};
