use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metric value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Counter(u64),
    Gauge(f64),
}

/// A single published metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: MetricValue,
    pub timestamp: i64,
}

/// Live metrics the occupancy tracker publishes for the platform dashboard
pub struct DashboardMetrics {
    gauges: Arc<RwLock<HashMap<String, f64>>>,
    counters: Arc<RwLock<HashMap<String, u64>>>,
}

impl DashboardMetrics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            gauges: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set a gauge value
    pub async fn set_gauge(&self, name: &str, value: f64) {
        let mut gauges = self.gauges.write().await;
        gauges.insert(name.to_string(), value);
    }

    /// Read a gauge value
    pub async fn gauge(&self, name: &str) -> Option<f64> {
        let gauges = self.gauges.read().await;
        gauges.get(name).copied()
    }

    /// Increment a counter
    pub async fn increment_counter(&self, name: &str, value: u64) {
        let mut counters = self.counters.write().await;
        *counters.entry(name.to_string()).or_insert(0) += value;
    }

    /// Read a counter value
    pub async fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.read().await;
        counters.get(name).copied().unwrap_or(0)
    }

    /// Snapshot all metrics for the dashboard
    pub async fn snapshot(&self) -> Vec<MetricSample> {
        let timestamp = Utc::now().timestamp();
        let mut samples = Vec::new();

        let counters = self.counters.read().await;
        for (name, value) in counters.iter() {
            samples.push(MetricSample {
                name: format!("counter.{}", name),
                value: MetricValue::Counter(*value),
                timestamp,
            });
        }

        let gauges = self.gauges.read().await;
        for (name, value) in gauges.iter() {
            samples.push(MetricSample {
                name: format!("gauge.{}", name),
                value: MetricValue::Gauge(*value),
                timestamp,
            });
        }

        samples
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        *self.gauges.write().await = HashMap::new();
        *self.counters.write().await = HashMap::new();
    }
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}
