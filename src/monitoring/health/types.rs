//! Health status types and snapshot structures
//!
//! This module defines the per-service result returned by probes, the
//! aggregated snapshot assembled by each cycle, and the change events
//! produced by diffing two snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classify::{ClassificationPolicy, classify_overall};

/// Health status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is fully operational
    Healthy,
    /// Service is operational but degraded
    Degraded,
    /// Service is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    /// Single-letter code used by the realtime payloads
    pub fn short_code(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "h",
            HealthStatus::Degraded => "d",
            HealthStatus::Unhealthy => "u",
        }
    }

    /// Whether the status still serves traffic
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dependency's status at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Health status
    pub status: HealthStatus,
    /// Probe round-trip in milliseconds
    pub response_time_ms: u64,
    /// When the probe completed
    pub last_checked_at: chrono::DateTime<chrono::Utc>,
    /// Human readable details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Probe-specific metrics (queue depth, hit rate, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, serde_json::Value>>,
}

impl ServiceHealth {
    /// Create a healthy result
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            response_time_ms,
            last_checked_at: chrono::Utc::now(),
            details: None,
            error: None,
            metrics: None,
        }
    }

    /// Create a degraded result
    pub fn degraded(reason: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            status: HealthStatus::Degraded,
            response_time_ms,
            last_checked_at: chrono::Utc::now(),
            details: Some(reason.into()),
            error: None,
            metrics: None,
        }
    }

    /// Create an unhealthy result
    pub fn unhealthy(error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms,
            last_checked_at: chrono::Utc::now(),
            details: None,
            error: Some(error.into()),
            metrics: None,
        }
    }

    /// Synthesized result for a probe that did not answer in time
    pub fn timed_out(response_time_ms: u64) -> Self {
        Self::unhealthy("timeout", response_time_ms)
    }

    /// Attach details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach a metric value
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metrics
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// An unhealthy result must always say why
    pub fn ensure_explained(mut self) -> Self {
        if self.status == HealthStatus::Unhealthy && self.error.is_none() && self.details.is_none()
        {
            self.details = Some("no reason reported".to_string());
        }
        self
    }

    /// Error and details joined, for reason matching
    pub fn reason_text(&self) -> String {
        match (&self.error, &self.details) {
            (Some(e), Some(d)) => format!("{} {}", e, d),
            (Some(e), None) => e.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Process-level metrics sampled once per cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// CPU usage percentage (may exceed 100 on some samplers)
    pub cpu_percent: f64,
    /// Memory usage percentage
    pub memory_percent: f64,
    /// Open HTTP requests plus realtime sessions
    pub active_connections: u64,
    /// Requests per minute
    pub request_rate: f64,
    /// Percentage of recent requests that failed with 5xx
    pub error_rate: f64,
}

/// The unified snapshot produced by one aggregation cycle
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedHealthStatus {
    overall: HealthStatus,
    /// Service name to health
    pub services: BTreeMap<String, ServiceHealth>,
    /// System metrics
    pub system: SystemMetrics,
    /// Process uptime
    pub uptime_seconds: u64,
    /// Snapshot assembly time
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AggregatedHealthStatus {
    /// Assemble a snapshot, deriving `overall` from services and system
    pub fn assemble(
        services: BTreeMap<String, ServiceHealth>,
        system: SystemMetrics,
        uptime_seconds: u64,
        policy: &ClassificationPolicy,
    ) -> Self {
        let overall = classify_overall(&services, &system, policy);
        Self {
            overall,
            services,
            system,
            uptime_seconds,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Snapshot served before the first cycle completes
    pub fn empty(uptime_seconds: u64) -> Self {
        Self {
            overall: HealthStatus::Healthy,
            services: BTreeMap::new(),
            system: SystemMetrics::default(),
            uptime_seconds,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Derived overall status
    pub fn overall(&self) -> HealthStatus {
        self.overall
    }

    /// Replace one service entry and re-derive `overall`
    pub fn with_service(
        mut self,
        name: &str,
        health: ServiceHealth,
        policy: &ClassificationPolicy,
    ) -> Self {
        self.services.insert(name.to_string(), health);
        self.overall = classify_overall(&self.services, &self.system, policy);
        self
    }
}

/// Kind of detected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Status moved between healthy/degraded/unhealthy
    Status,
    /// Response time regressed
    Performance,
    /// A system metric crossed its threshold
    Metric,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Status => "status",
            ChangeType::Performance => "performance",
            ChangeType::Metric => "metric",
        }
    }
}

/// Severity of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSeverity {
    Info,
    Warning,
    Critical,
}

impl ChangeSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSeverity::Info => "info",
            ChangeSeverity::Warning => "warning",
            ChangeSeverity::Critical => "critical",
        }
    }

    /// Severity of a status transition
    pub fn for_transition(previous: HealthStatus, current: HealthStatus) -> Self {
        match (previous, current) {
            (HealthStatus::Healthy, HealthStatus::Unhealthy) => ChangeSeverity::Critical,
            (HealthStatus::Healthy, HealthStatus::Degraded) => ChangeSeverity::Warning,
            _ => ChangeSeverity::Info,
        }
    }
}

/// A detected transition between two consecutive snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChange {
    /// Service name, `overall` or `system:<metric>`
    pub service: String,
    /// Status in the previous snapshot (absent for new services)
    pub previous_status: Option<HealthStatus>,
    /// Status in the current snapshot
    pub current_status: HealthStatus,
    /// Kind of change
    pub change_type: ChangeType,
    /// Severity
    pub severity: ChangeSeverity,
    /// Detection time
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Short summary
    pub message: String,
}

impl HealthChange {
    /// Status transition between two known states
    pub fn status(service: &str, previous: HealthStatus, current: HealthStatus) -> Self {
        Self {
            service: service.to_string(),
            previous_status: Some(previous),
            current_status: current,
            change_type: ChangeType::Status,
            severity: ChangeSeverity::for_transition(previous, current),
            timestamp: chrono::Utc::now(),
            message: format!("{} changed from {} to {}", service, previous, current),
        }
    }

    /// Service seen for the first time
    pub fn appeared(service: &str, current: HealthStatus) -> Self {
        Self {
            service: service.to_string(),
            previous_status: None,
            current_status: current,
            change_type: ChangeType::Status,
            severity: ChangeSeverity::Info,
            timestamp: chrono::Utc::now(),
            message: format!("{} reported for the first time as {}", service, current),
        }
    }

    /// Response time regression
    pub fn performance(service: &str, status: HealthStatus, previous_ms: u64, current_ms: u64) -> Self {
        Self {
            service: service.to_string(),
            previous_status: Some(status),
            current_status: status,
            change_type: ChangeType::Performance,
            severity: ChangeSeverity::Warning,
            timestamp: chrono::Utc::now(),
            message: format!(
                "{} response time rose from {}ms to {}ms",
                service, previous_ms, current_ms
            ),
        }
    }

    /// System metric crossed its threshold
    pub fn metric(metric: &str, value: f64, threshold: f64) -> Self {
        Self {
            service: format!("system:{}", metric),
            previous_status: Some(HealthStatus::Healthy),
            current_status: HealthStatus::Degraded,
            change_type: ChangeType::Metric,
            severity: ChangeSeverity::Warning,
            timestamp: chrono::Utc::now(),
            message: format!("{} at {:.1} reached threshold {:.1}", metric, value, threshold),
        }
    }
}
