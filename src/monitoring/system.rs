//! Core HealthSystem implementation

use std::sync::Arc;
use tracing::info;

use super::health::{
    AggregatorSettings, BackgroundMonitor, ChangeDetector, HealthAggregator, MonitorSettings,
    ProbeRegistry, StatusCache,
};
use super::metrics::{ProcessMetricsSource, RequestMetricsCollector, SystemMetricsSource};
use super::probes::{ProbeDependencies, build_registry, classification_policy};
use super::realtime::RealtimeBroadcaster;
use crate::config::Config;
use crate::utils::error::Result;

/// Everything the health subsystem needs, wired from one configuration
#[derive(Clone)]
pub struct HealthSystem {
    cache: Arc<StatusCache>,
    requests: Arc<RequestMetricsCollector>,
    broadcaster: Arc<RealtimeBroadcaster>,
    aggregator: HealthAggregator,
    monitor: Arc<BackgroundMonitor>,
}

impl HealthSystem {
    /// Build the subsystem with probes taken from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let (cache, requests, broadcaster) = Self::shared_parts(config);
        let registry = build_registry(
            config,
            &ProbeDependencies {
                requests: requests.clone(),
                broadcaster: broadcaster.clone(),
            },
        )?;
        let metrics = Arc::new(ProcessMetricsSource::new(
            requests.clone(),
            config.monitoring().metrics.enabled,
        ));
        Ok(Self::assemble(config, registry, cache, requests, broadcaster, metrics))
    }

    /// Build the subsystem around an explicit registry and metrics source
    pub fn with_registry(
        config: &Config,
        registry: ProbeRegistry,
        metrics: Arc<dyn SystemMetricsSource>,
    ) -> Self {
        let (cache, requests, broadcaster) = Self::shared_parts(config);
        Self::assemble(config, registry, cache, requests, broadcaster, metrics)
    }

    fn shared_parts(
        config: &Config,
    ) -> (
        Arc<StatusCache>,
        Arc<RequestMetricsCollector>,
        Arc<RealtimeBroadcaster>,
    ) {
        let cache = Arc::new(StatusCache::new(config.health().hard_ceiling()));
        let requests = Arc::new(RequestMetricsCollector::new(
            config.monitoring().metrics.window(),
        ));
        let broadcaster = Arc::new(RealtimeBroadcaster::new(
            cache.clone(),
            &config.monitoring().realtime,
        ));
        (cache, requests, broadcaster)
    }

    fn assemble(
        config: &Config,
        registry: ProbeRegistry,
        cache: Arc<StatusCache>,
        requests: Arc<RequestMetricsCollector>,
        broadcaster: Arc<RealtimeBroadcaster>,
        metrics: Arc<dyn SystemMetricsSource>,
    ) -> Self {
        let policy = classification_policy(config, &registry);
        let aggregator = HealthAggregator::new(
            registry,
            cache.clone(),
            policy,
            metrics,
            AggregatorSettings::from(config.health()),
        );
        let monitor = Arc::new(BackgroundMonitor::new(
            aggregator.clone(),
            broadcaster.clone(),
            ChangeDetector::from_config(config.health()),
            MonitorSettings::from(config.monitoring()),
        ));

        Self {
            cache,
            requests,
            broadcaster,
            aggregator,
            monitor,
        }
    }

    /// Start background monitoring
    pub fn start(&self) {
        info!("Starting health system");
        self.monitor.start();
    }

    /// Stop background monitoring and drop cached state
    pub async fn stop(&self) {
        info!("Stopping health system");
        self.monitor.stop().await;
        self.cache.clear();
        info!("Health system stopped");
    }

    pub fn aggregator(&self) -> &HealthAggregator {
        &self.aggregator
    }

    pub fn monitor(&self) -> &Arc<BackgroundMonitor> {
        &self.monitor
    }

    pub fn broadcaster(&self) -> &Arc<RealtimeBroadcaster> {
        &self.broadcaster
    }

    pub fn requests(&self) -> &Arc<RequestMetricsCollector> {
        &self.requests
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }
}

impl std::fmt::Debug for HealthSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthSystem")
            .field("aggregator", &self.aggregator)
            .field("monitor_running", &self.monitor.is_running())
            .finish()
    }
}
