//! Process metrics source
//!
//! CPU and memory come from sysinfo when the `metrics` feature is enabled
//! and read as zero otherwise; request figures come from the collector.

use super::SystemMetricsSource;
use super::collector::RequestMetricsCollector;
use crate::monitoring::health::SystemMetrics;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use sysinfo::System;

#[cfg(feature = "metrics")]
static SYSTEM: Lazy<parking_lot::Mutex<System>> =
    Lazy::new(|| parking_lot::Mutex::new(System::new_all()));

#[cfg(feature = "metrics")]
pub(super) fn get_cpu_usage() -> f64 {
    let mut sys = SYSTEM.lock();
    sys.refresh_cpu_usage();
    sys.global_cpu_usage() as f64
}

#[cfg(not(feature = "metrics"))]
pub(super) fn get_cpu_usage() -> f64 {
    0.0
}

#[cfg(feature = "metrics")]
pub(super) fn get_memory_percent() -> f64 {
    let mut sys = SYSTEM.lock();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return 0.0;
    }
    sys.used_memory() as f64 / total as f64 * 100.0
}

#[cfg(not(feature = "metrics"))]
pub(super) fn get_memory_percent() -> f64 {
    0.0
}

/// Samples host CPU/memory and the request collector
#[derive(Debug, Clone)]
pub struct ProcessMetricsSource {
    requests: Arc<RequestMetricsCollector>,
    host_sampling: bool,
}

impl ProcessMetricsSource {
    /// Create a source; `host_sampling = false` skips sysinfo entirely
    pub fn new(requests: Arc<RequestMetricsCollector>, host_sampling: bool) -> Self {
        Self {
            requests,
            host_sampling,
        }
    }

    /// The request collector feeding this source
    pub fn requests(&self) -> &Arc<RequestMetricsCollector> {
        &self.requests
    }
}

impl SystemMetricsSource for ProcessMetricsSource {
    fn sample(&self) -> SystemMetrics {
        let stats = self.requests.stats();
        let (cpu_percent, memory_percent) = if self.host_sampling {
            (get_cpu_usage(), get_memory_percent())
        } else {
            (0.0, 0.0)
        };

        SystemMetrics {
            cpu_percent,
            memory_percent,
            active_connections: stats.active_connections,
            request_rate: stats.request_rate,
            error_rate: stats.error_rate,
        }
    }
}
