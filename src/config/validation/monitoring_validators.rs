//! Monitoring configuration validators
//!
//! This module provides validation implementations for MonitoringConfig,
//! HealthConfig, RealtimeConfig and MetricsConfig.

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for MonitoringConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating monitoring configuration");

        self.health.validate()?;
        self.realtime.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

impl Validate for HealthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.check_interval_ms == 0 || self.critical_check_interval_ms == 0 {
            return Err("Check intervals must be greater than 0".to_string());
        }

        if self.reuse_window_ms > self.hard_ceiling_ms {
            return Err("Reuse window cannot exceed the hard ceiling".to_string());
        }

        if self.snapshot_fresh_ms > self.hard_ceiling_ms {
            return Err("Snapshot freshness window cannot exceed the hard ceiling".to_string());
        }

        if self.reverify_timeout_ms == 0 {
            return Err("Re-verification timeout must be greater than 0".to_string());
        }

        if self.performance_regression_factor <= 1.0 {
            return Err("Performance regression factor must be greater than 1.0".to_string());
        }

        self.degraded_thresholds.validate()?;
        self.warning_thresholds.validate()?;

        Ok(())
    }
}

impl Validate for SystemThresholds {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("cpu_percent", self.cpu_percent),
            ("memory_percent", self.memory_percent),
            ("error_rate", self.error_rate),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("Threshold {} must be between 0 and 100", name));
            }
        }
        Ok(())
    }
}

impl Validate for RealtimeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_room.is_empty() {
            return Err("Default room cannot be empty".to_string());
        }

        if self.heartbeat_interval_ms == 0 {
            return Err("Heartbeat interval must be greater than 0".to_string());
        }

        if self.channel_capacity == 0 {
            return Err("Channel capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for MetricsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window_secs == 0 {
            return Err("Metrics window must be greater than 0".to_string());
        }

        Ok(())
    }
}
