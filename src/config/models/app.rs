//! Top-level service configuration

#![allow(missing_docs)]

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Monitoring configuration
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Monitored dependencies
    #[serde(default = "default_probes")]
    pub probes: Vec<ProbeConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            monitoring: MonitoringConfig::default(),
            probes: default_probes(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Merge two configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.monitoring = self.monitoring.merge(other.monitoring);
        self.logging = self.logging.merge(other.logging);

        // Probes merge by name, keeping the original order and appending new ones
        let mut overrides: HashMap<String, ProbeConfig> = other
            .probes
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        for probe in &mut self.probes {
            if let Some(replacement) = overrides.remove(&probe.name) {
                *probe = replacement;
            }
        }
        let mut appended: Vec<ProbeConfig> = overrides.into_values().collect();
        appended.sort_by(|a, b| a.name.cmp(&b.name));
        self.probes.extend(appended);

        self
    }

    /// Find a probe entry by name
    pub fn probe(&self, name: &str) -> Option<&ProbeConfig> {
        self.probes.iter().find(|p| p.name == name)
    }
}
