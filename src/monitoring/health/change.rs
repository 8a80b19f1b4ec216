//! Change detection between consecutive snapshots

use super::classify::cpu_reading_is_valid;
use super::types::{AggregatedHealthStatus, HealthChange, ServiceHealth, SystemMetrics};
use crate::config::{HealthConfig, SystemThresholds};

/// Service name used for overall status changes
pub const OVERALL: &str = "overall";

/// Diffs each snapshot against the one before it
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    previous: Option<AggregatedHealthStatus>,
    thresholds: SystemThresholds,
    regression_factor: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(SystemThresholds::warning(), 1.5)
    }
}

impl ChangeDetector {
    /// Create a detector with metric thresholds and response-time factor
    pub fn new(thresholds: SystemThresholds, regression_factor: f64) -> Self {
        Self {
            previous: None,
            thresholds,
            regression_factor,
        }
    }

    /// Create a detector from health configuration
    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.warning_thresholds, config.performance_regression_factor)
    }

    /// Compare `current` with the previous snapshot and remember it
    ///
    /// The first call only records the snapshot.
    pub fn detect(&mut self, current: &AggregatedHealthStatus) -> Vec<HealthChange> {
        let changes = match self.previous.as_ref() {
            Some(previous) => self.diff(previous, current),
            None => Vec::new(),
        };
        self.previous = Some(current.clone());
        changes
    }

    /// Move the baseline for one service to a result already announced
    ///
    /// The baseline's overall status is left alone. Without a baseline
    /// this does nothing.
    pub fn observe_service(&mut self, name: &str, health: &ServiceHealth) {
        if let Some(previous) = self.previous.as_mut() {
            previous.services.insert(name.to_string(), health.clone());
        }
    }

    /// Forget the previous snapshot
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Whether a previous snapshot is held
    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    fn diff(
        &self,
        previous: &AggregatedHealthStatus,
        current: &AggregatedHealthStatus,
    ) -> Vec<HealthChange> {
        let mut changes = Vec::new();

        if previous.overall() != current.overall() {
            changes.push(HealthChange::status(
                OVERALL,
                previous.overall(),
                current.overall(),
            ));
        }

        for (name, health) in &current.services {
            match previous.services.get(name) {
                Some(before) => {
                    if before.status != health.status {
                        changes.push(HealthChange::status(name, before.status, health.status));
                    }
                    if health.response_time_ms as f64
                        > before.response_time_ms as f64 * self.regression_factor
                    {
                        changes.push(HealthChange::performance(
                            name,
                            health.status,
                            before.response_time_ms,
                            health.response_time_ms,
                        ));
                    }
                }
                None => changes.push(HealthChange::appeared(name, health.status)),
            }
        }

        changes.extend(self.metric_crossings(&previous.system, &current.system));
        changes
    }

    fn metric_crossings(&self, previous: &SystemMetrics, current: &SystemMetrics) -> Vec<HealthChange> {
        let crossed = |before: f64, now: f64, threshold: f64| before < threshold && now >= threshold;
        let mut changes = Vec::new();

        // An artifact reading counts as below the threshold
        let previous_cpu = if cpu_reading_is_valid(previous.cpu_percent) {
            previous.cpu_percent
        } else {
            0.0
        };
        if cpu_reading_is_valid(current.cpu_percent)
            && crossed(previous_cpu, current.cpu_percent, self.thresholds.cpu_percent)
        {
            changes.push(HealthChange::metric(
                "cpu",
                current.cpu_percent,
                self.thresholds.cpu_percent,
            ));
        }
        if crossed(
            previous.memory_percent,
            current.memory_percent,
            self.thresholds.memory_percent,
        ) {
            changes.push(HealthChange::metric(
                "memory",
                current.memory_percent,
                self.thresholds.memory_percent,
            ));
        }
        if crossed(
            previous.error_rate,
            current.error_rate,
            self.thresholds.error_rate,
        ) {
            changes.push(HealthChange::metric(
                "error_rate",
                current.error_rate,
                self.thresholds.error_rate,
            ));
        }

        changes
    }
}
