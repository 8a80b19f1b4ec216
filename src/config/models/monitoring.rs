//! Monitoring configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitoringConfig {
    /// Health aggregation configuration
    #[serde(default)]
    pub health: HealthConfig,
    /// Realtime channel configuration
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// System and request metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl MonitoringConfig {
    /// Merge monitoring configurations
    pub fn merge(mut self, other: Self) -> Self {
        self.health = self.health.merge(other.health);
        self.realtime = self.realtime.merge(other.realtime);
        self.metrics = self.metrics.merge(other.metrics);
        self
    }
}

/// System metric levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemThresholds {
    /// CPU usage percentage
    pub cpu_percent: f64,
    /// Memory usage percentage
    pub memory_percent: f64,
    /// Error rate percentage
    pub error_rate: f64,
}

impl SystemThresholds {
    /// Levels at which the overall status degrades
    pub fn critical() -> Self {
        Self {
            cpu_percent: 95.0,
            memory_percent: 95.0,
            error_rate: 10.0,
        }
    }

    /// Levels at which a metric change event is emitted
    pub fn warning() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
            error_rate: 5.0,
        }
    }
}

/// Health aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Full aggregation cycle cadence
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Cadence of the fast loop for the most critical dependency
    #[serde(default = "default_critical_check_interval_ms")]
    pub critical_check_interval_ms: u64,
    /// Service polled by the fast loop
    #[serde(default = "default_critical_check_service")]
    pub critical_check_service: String,
    /// Reuse a cached probe result younger than this
    #[serde(default = "default_reuse_window_ms")]
    pub reuse_window_ms: u64,
    /// Serve the cached snapshot when younger than this
    #[serde(default = "default_snapshot_fresh_ms")]
    pub snapshot_fresh_ms: u64,
    /// Never trust cached values older than this
    #[serde(default = "default_hard_ceiling_ms")]
    pub hard_ceiling_ms: u64,
    /// Minimum gap between on-demand cycles
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    /// Bound on the re-verification of a failing critical service
    #[serde(default = "default_reverify_timeout_ms")]
    pub reverify_timeout_ms: u64,
    /// Levels that degrade the overall status
    #[serde(default = "SystemThresholds::critical")]
    pub degraded_thresholds: SystemThresholds,
    /// Levels that raise metric change events
    #[serde(default = "SystemThresholds::warning")]
    pub warning_thresholds: SystemThresholds,
    /// Response time growth factor reported as a regression
    #[serde(default = "default_regression_factor")]
    pub performance_regression_factor: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            critical_check_interval_ms: default_critical_check_interval_ms(),
            critical_check_service: default_critical_check_service(),
            reuse_window_ms: default_reuse_window_ms(),
            snapshot_fresh_ms: default_snapshot_fresh_ms(),
            hard_ceiling_ms: default_hard_ceiling_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            reverify_timeout_ms: default_reverify_timeout_ms(),
            degraded_thresholds: SystemThresholds::critical(),
            warning_thresholds: SystemThresholds::warning(),
            performance_regression_factor: default_regression_factor(),
        }
    }
}

impl HealthConfig {
    /// Merge health configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.check_interval_ms != default_check_interval_ms() {
            self.check_interval_ms = other.check_interval_ms;
        }
        if other.critical_check_interval_ms != default_critical_check_interval_ms() {
            self.critical_check_interval_ms = other.critical_check_interval_ms;
        }
        if other.critical_check_service != default_critical_check_service() {
            self.critical_check_service = other.critical_check_service;
        }
        if other.reuse_window_ms != default_reuse_window_ms() {
            self.reuse_window_ms = other.reuse_window_ms;
        }
        if other.snapshot_fresh_ms != default_snapshot_fresh_ms() {
            self.snapshot_fresh_ms = other.snapshot_fresh_ms;
        }
        if other.hard_ceiling_ms != default_hard_ceiling_ms() {
            self.hard_ceiling_ms = other.hard_ceiling_ms;
        }
        if other.min_request_interval_ms != default_min_request_interval_ms() {
            self.min_request_interval_ms = other.min_request_interval_ms;
        }
        if other.reverify_timeout_ms != default_reverify_timeout_ms() {
            self.reverify_timeout_ms = other.reverify_timeout_ms;
        }
        if other.degraded_thresholds != SystemThresholds::critical() {
            self.degraded_thresholds = other.degraded_thresholds;
        }
        if other.warning_thresholds != SystemThresholds::warning() {
            self.warning_thresholds = other.warning_thresholds;
        }
        if other.performance_regression_factor != default_regression_factor() {
            self.performance_regression_factor = other.performance_regression_factor;
        }
        self
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn critical_check_interval(&self) -> Duration {
        Duration::from_millis(self.critical_check_interval_ms)
    }

    pub fn reuse_window(&self) -> Duration {
        Duration::from_millis(self.reuse_window_ms)
    }

    pub fn snapshot_fresh(&self) -> Duration {
        Duration::from_millis(self.snapshot_fresh_ms)
    }

    pub fn hard_ceiling(&self) -> Duration {
        Duration::from_millis(self.hard_ceiling_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn reverify_timeout(&self) -> Duration {
        Duration::from_millis(self.reverify_timeout_ms)
    }
}

/// Realtime channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Enable the websocket endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Room joined by a bare `subscribe`
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Heartbeat cadence
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Per-room buffered events before slow subscribers start skipping
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Push a full snapshot at least every N cycles even without changes
    #[serde(default = "default_snapshot_every_cycles")]
    pub snapshot_every_cycles: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_room: default_room(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            channel_capacity: default_channel_capacity(),
            snapshot_every_cycles: default_snapshot_every_cycles(),
        }
    }
}

impl RealtimeConfig {
    /// Merge realtime configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.default_room != default_room() {
            self.default_room = other.default_room;
        }
        if other.heartbeat_interval_ms != default_heartbeat_interval_ms() {
            self.heartbeat_interval_ms = other.heartbeat_interval_ms;
        }
        if other.channel_capacity != default_channel_capacity() {
            self.channel_capacity = other.channel_capacity;
        }
        if other.snapshot_every_cycles != default_snapshot_every_cycles() {
            self.snapshot_every_cycles = other.snapshot_every_cycles;
        }
        self
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// System and request metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Sample CPU and memory from the host
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window over which request and error rates are computed
    #[serde(default = "default_metrics_window_secs")]
    pub window_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_metrics_window_secs(),
        }
    }
}

impl MetricsConfig {
    /// Merge metrics configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.window_secs != default_metrics_window_secs() {
            self.window_secs = other.window_secs;
        }
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
