//! Overall status classification
//!
//! `classify_overall` is the only place an overall status is derived.

use std::collections::{BTreeMap, HashSet};

use super::types::{HealthStatus, ServiceHealth, SystemMetrics};
use crate::config::SystemThresholds;

/// Samplers occasionally report more than 100% on multi-core hosts.
pub const CPU_MEASUREMENT_CEILING: f64 = 100.0;

/// Inputs to overall classification besides the snapshot itself
#[derive(Debug, Clone)]
pub struct ClassificationPolicy {
    /// Services whose unhealthy status alone makes the system unhealthy
    pub critical_services: HashSet<String>,
    /// System metric levels that degrade the system
    pub degraded_thresholds: SystemThresholds,
}

impl ClassificationPolicy {
    /// Create a policy
    pub fn new<I, S>(critical_services: I, degraded_thresholds: SystemThresholds) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            critical_services: critical_services.into_iter().map(Into::into).collect(),
            degraded_thresholds,
        }
    }

    /// Whether a service is critical
    pub fn is_critical(&self, service: &str) -> bool {
        self.critical_services.contains(service)
    }
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self::new(["database", "cache"], SystemThresholds::critical())
    }
}

/// Whether a CPU reading is plausible enough to act on
pub fn cpu_reading_is_valid(cpu_percent: f64) -> bool {
    cpu_percent.is_finite() && (0.0..=CPU_MEASUREMENT_CEILING).contains(&cpu_percent)
}

/// System metrics crossing the degraded thresholds, as metric names
pub fn breached_metrics(system: &SystemMetrics, thresholds: &SystemThresholds) -> Vec<&'static str> {
    let mut breached = Vec::new();
    if cpu_reading_is_valid(system.cpu_percent) && system.cpu_percent >= thresholds.cpu_percent {
        breached.push("cpu");
    }
    if system.memory_percent >= thresholds.memory_percent {
        breached.push("memory");
    }
    if system.error_rate >= thresholds.error_rate {
        breached.push("error_rate");
    }
    breached
}

/// Derive the overall status of a snapshot
pub fn classify_overall(
    services: &BTreeMap<String, ServiceHealth>,
    system: &SystemMetrics,
    policy: &ClassificationPolicy,
) -> HealthStatus {
    let critical_down = services
        .iter()
        .any(|(name, health)| policy.is_critical(name) && health.status == HealthStatus::Unhealthy);
    if critical_down {
        return HealthStatus::Unhealthy;
    }

    let any_service_impaired = services
        .values()
        .any(|health| health.status != HealthStatus::Healthy);
    if any_service_impaired || !breached_metrics(system, &policy.degraded_thresholds).is_empty() {
        return HealthStatus::Degraded;
    }

    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(entries: &[(&str, ServiceHealth)]) -> BTreeMap<String, ServiceHealth> {
        entries
            .iter()
            .map(|(name, health)| (name.to_string(), health.clone()))
            .collect()
    }

    #[test]
    fn test_critical_unhealthy_makes_overall_unhealthy() {
        let policy = ClassificationPolicy::default();
        let snapshot = services(&[
            ("database", ServiceHealth::unhealthy("connection refused", 12)),
            ("queue", ServiceHealth::healthy(4)),
        ]);
        assert_eq!(
            classify_overall(&snapshot, &SystemMetrics::default(), &policy),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_non_critical_unhealthy_only_degrades() {
        let policy = ClassificationPolicy::default();
        let snapshot = services(&[
            ("database", ServiceHealth::healthy(3)),
            ("queue", ServiceHealth::unhealthy("broker gone", 7)),
        ]);
        assert_eq!(
            classify_overall(&snapshot, &SystemMetrics::default(), &policy),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_cpu_artifact_is_ignored() {
        let policy = ClassificationPolicy::default();
        let snapshot = services(&[("database", ServiceHealth::healthy(3))]);
        let system = SystemMetrics {
            cpu_percent: 187.5,
            ..Default::default()
        };
        assert_eq!(classify_overall(&snapshot, &system, &policy), HealthStatus::Healthy);
    }

    #[test]
    fn test_metric_thresholds_degrade() {
        let policy = ClassificationPolicy::default();
        let snapshot = services(&[("database", ServiceHealth::healthy(3))]);

        let cpu = SystemMetrics {
            cpu_percent: 95.0,
            ..Default::default()
        };
        assert_eq!(classify_overall(&snapshot, &cpu, &policy), HealthStatus::Degraded);

        let memory = SystemMetrics {
            memory_percent: 96.2,
            ..Default::default()
        };
        assert_eq!(classify_overall(&snapshot, &memory, &policy), HealthStatus::Degraded);

        let errors = SystemMetrics {
            error_rate: 10.0,
            ..Default::default()
        };
        assert_eq!(classify_overall(&snapshot, &errors, &policy), HealthStatus::Degraded);

        let calm = SystemMetrics {
            cpu_percent: 94.9,
            memory_percent: 50.0,
            error_rate: 9.9,
            ..Default::default()
        };
        assert_eq!(classify_overall(&snapshot, &calm, &policy), HealthStatus::Healthy);
    }

    #[test]
    fn test_empty_snapshot_is_healthy() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            classify_overall(&BTreeMap::new(), &SystemMetrics::default(), &policy),
            HealthStatus::Healthy
        );
    }
}
