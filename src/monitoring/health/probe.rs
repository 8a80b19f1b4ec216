//! Probe contract and registry
//!
//! A probe answers for exactly one dependency. The registry is the
//! capability set the aggregator works from: dependencies absent from a
//! deployment are simply not registered.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::types::ServiceHealth;

/// Health probe for one dependency
///
/// `check` must not fail: internal errors are reported as an unhealthy
/// result with `error` set.
#[async_trait]
pub trait ServiceHealthProbe: Send + Sync {
    /// Probe the dependency
    async fn check(&self) -> ServiceHealth;

    /// Direct reconnect attempt used to confirm a critical failure
    async fn verify(&self) -> ServiceHealth {
        self.check().await
    }

    /// Whether the dependency is configured in this deployment
    fn is_configured(&self) -> bool {
        true
    }
}

/// Per-probe aggregation settings
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Upper bound on a single `check`
    pub timeout: Duration,
    /// Unhealthy alone makes the system unhealthy
    pub critical: bool,
    /// May be legitimately absent
    pub optional: bool,
    /// Reuse a cached result younger than this
    pub reuse_window: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            critical: false,
            optional: false,
            reuse_window: Duration::from_secs(15),
        }
    }
}

impl ProbeSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_reuse_window(mut self, reuse_window: Duration) -> Self {
        self.reuse_window = reuse_window;
        self
    }
}

/// A probe together with its settings
#[derive(Clone)]
pub struct RegisteredProbe {
    /// Service name
    pub name: String,
    /// Probe implementation
    pub probe: Arc<dyn ServiceHealthProbe>,
    /// Aggregation settings
    pub settings: ProbeSettings,
}

impl std::fmt::Debug for RegisteredProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProbe")
            .field("name", &self.name)
            .field("configured", &self.probe.is_configured())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Service name to probe mapping, in registration order
#[derive(Debug, Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<RegisteredProbe>,
}

impl ProbeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe; re-registering a name replaces the earlier entry
    pub fn register(
        &mut self,
        name: impl Into<String>,
        probe: Arc<dyn ServiceHealthProbe>,
        settings: ProbeSettings,
    ) {
        let name = name.into();
        let entry = RegisteredProbe {
            name: name.clone(),
            probe,
            settings,
        };
        match self.probes.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = entry,
            None => self.probes.push(entry),
        }
    }

    /// Builder-style registration
    pub fn with(
        mut self,
        name: impl Into<String>,
        probe: Arc<dyn ServiceHealthProbe>,
        settings: ProbeSettings,
    ) -> Self {
        self.register(name, probe, settings);
        self
    }

    /// Look up a probe by service name
    pub fn get(&self, name: &str) -> Option<&RegisteredProbe> {
        self.probes.iter().find(|p| p.name == name)
    }

    /// All registered probes
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProbe> {
        self.probes.iter()
    }

    /// Registered service names
    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of critical services
    pub fn critical_services(&self) -> Vec<String> {
        self.probes
            .iter()
            .filter(|p| p.settings.critical)
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}
