//! Probe construction from configuration

use std::sync::Arc;
use tracing::{debug, info};

use super::builtin::{ApiProbe, LoggerProbe, RealtimeProbe, UnconfiguredProbe};
use super::http::HttpProbe;
use super::tcp::TcpProbe;
use crate::config::{Config, ProbeConfig, ProbeKind};
use crate::monitoring::health::{
    ClassificationPolicy, ProbeRegistry, ProbeSettings, ServiceHealthProbe,
};
use crate::monitoring::metrics::RequestMetricsCollector;
use crate::monitoring::realtime::RealtimeBroadcaster;
use crate::utils::error::{HealthcastError, Result};

/// Shared components some probes report on
#[derive(Debug, Clone)]
pub struct ProbeDependencies {
    pub requests: Arc<RequestMetricsCollector>,
    pub broadcaster: Arc<RealtimeBroadcaster>,
}

/// Build the probe registry for a configuration
pub fn build_registry(config: &Config, deps: &ProbeDependencies) -> Result<ProbeRegistry> {
    let mut registry = ProbeRegistry::new();
    for probe in config.probes() {
        let implementation = build_probe(probe, config, deps)?;
        let settings = probe_settings(probe, config);
        debug!(
            "Registered {:?} probe {} (critical: {}, optional: {})",
            probe.kind, probe.name, settings.critical, settings.optional
        );
        registry.register(probe.name.clone(), implementation, settings);
    }
    info!("Monitoring {} services", registry.len());
    Ok(registry)
}

/// Classification policy matching a registry
pub fn classification_policy(config: &Config, registry: &ProbeRegistry) -> ClassificationPolicy {
    ClassificationPolicy::new(
        registry.critical_services(),
        config.health().degraded_thresholds,
    )
}

fn probe_settings(probe: &ProbeConfig, config: &Config) -> ProbeSettings {
    let reuse_window = probe
        .reuse_window_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.health().reuse_window());

    let mut settings = ProbeSettings::default()
        .with_timeout(probe.timeout())
        .with_reuse_window(reuse_window);
    if probe.critical {
        settings = settings.critical();
    }
    if probe.optional {
        settings = settings.optional();
    }
    settings
}

fn build_probe(
    probe: &ProbeConfig,
    config: &Config,
    deps: &ProbeDependencies,
) -> Result<Arc<dyn ServiceHealthProbe>> {
    let target = || {
        probe.target.clone().ok_or_else(|| {
            HealthcastError::config(format!("Probe {} requires a target", probe.name))
        })
    };

    Ok(match probe.kind {
        ProbeKind::Tcp => Arc::new(TcpProbe::new(target()?)),
        ProbeKind::Http => Arc::new(HttpProbe::new(target()?, probe.timeout())?),
        ProbeKind::Api => Arc::new(ApiProbe::new(
            deps.requests.clone(),
            config.health().degraded_thresholds.error_rate,
        )),
        ProbeKind::Logger => Arc::new(LoggerProbe),
        ProbeKind::Realtime => Arc::new(RealtimeProbe::new(
            &deps.broadcaster,
            config.monitoring().realtime.enabled,
        )),
        ProbeKind::Unconfigured => Arc::new(UnconfiguredProbe::new(probe.name.clone())),
    })
}
