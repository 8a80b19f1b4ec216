//! Metrics collection
//!
//! Request counters fed by the HTTP middleware and the realtime endpoint,
//! and the system metrics source sampled once per health cycle.

mod bounded;
mod collector;
mod system;


pub use collector::{ConnectionGuard, RequestMetricsCollector, RequestStats};
pub use system::ProcessMetricsSource;

use crate::monitoring::health::SystemMetrics;
use parking_lot::RwLock;

/// Source of the system metrics attached to each snapshot
pub trait SystemMetricsSource: Send + Sync {
    /// Take one sample
    fn sample(&self) -> SystemMetrics;
}

/// Source that returns whatever was last set
#[derive(Debug, Default)]
pub struct FixedMetricsSource {
    metrics: RwLock<SystemMetrics>,
}

impl FixedMetricsSource {
    pub fn new(metrics: SystemMetrics) -> Self {
        Self {
            metrics: RwLock::new(metrics),
        }
    }

    /// Replace the reported metrics
    pub fn set(&self, metrics: SystemMetrics) {
        *self.metrics.write() = metrics;
    }
}

impl SystemMetricsSource for FixedMetricsSource {
    fn sample(&self) -> SystemMetrics {
        self.metrics.read().clone()
    }
}
