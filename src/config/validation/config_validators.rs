//! Top-level configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating service configuration");

        self.server.validate()?;
        self.monitoring.validate()?;

        let mut names = HashSet::new();
        for probe in &self.probes {
            probe.validate()?;
            if !names.insert(probe.name.as_str()) {
                return Err(format!("Duplicate probe name: {}", probe.name));
            }
        }

        let fast_loop_target = &self.monitoring.health.critical_check_service;
        if let Some(probe) = self.probe(fast_loop_target) {
            if probe.kind == ProbeKind::Unconfigured {
                return Err(format!(
                    "critical_check_service {} must not be an unconfigured probe",
                    fast_loop_target
                ));
            }
        }

        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.workers == Some(0) {
            return Err("Workers must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for ProbeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Probe name cannot be empty".to_string());
        }

        if self.name == "overall" || self.name.starts_with("system:") {
            return Err(format!("Probe name {} is reserved", self.name));
        }

        if self.kind.requires_target() && self.target.as_deref().is_none_or(str::is_empty) {
            return Err(format!("Probe {} requires a target", self.name));
        }

        if self.kind == ProbeKind::Http {
            if let Some(target) = &self.target {
                if !target.starts_with("http://") && !target.starts_with("https://") {
                    return Err(format!(
                        "Probe {} target must use http:// or https://",
                        self.name
                    ));
                }
            }
        }

        if self.timeout_ms == Some(0) {
            return Err(format!("Probe {} timeout cannot be 0", self.name));
        }

        Ok(())
    }
}
