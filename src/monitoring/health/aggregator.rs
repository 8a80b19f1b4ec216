//! Health aggregator
//!
//! Runs every registered probe concurrently under its own timeout, folds
//! optional and unconfigured dependencies back to neutral, re-verifies
//! failing critical services and assembles the snapshot.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::cache::StatusCache;
use super::classify::ClassificationPolicy;
use super::dedup::RequestDeduplicator;
use super::probe::{ProbeRegistry, RegisteredProbe};
use super::types::{AggregatedHealthStatus, HealthStatus, ServiceHealth, SystemMetrics};
use crate::config::HealthConfig;
use crate::monitoring::metrics::SystemMetricsSource;

/// Details given to every service when a cycle fails outright
pub const AGGREGATION_FAILED_DETAILS: &str = "health aggregator could not determine status";

/// Details given to a remapped optional service
pub const NOT_CONFIGURED_DETAILS: &str = "not configured";

/// Service that stays healthy in the fallback snapshot: if this code runs,
/// the API is serving.
pub const API_SERVICE: &str = "api";

/// Timing knobs for the aggregator
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Serve the cached snapshot when younger than this
    pub snapshot_fresh: Duration,
    /// Bound on a critical service's re-verification
    pub reverify_timeout: Duration,
    /// Minimum gap between on-demand cycles
    pub min_request_interval: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from(&HealthConfig::default())
    }
}

impl From<&HealthConfig> for AggregatorSettings {
    fn from(config: &HealthConfig) -> Self {
        Self {
            snapshot_fresh: config.snapshot_fresh(),
            reverify_timeout: config.reverify_timeout(),
            min_request_interval: config.min_request_interval(),
        }
    }
}

/// Whether an unhealthy result only reflects an absent dependency
///
/// Applies to probes that are optional or report themselves unconfigured;
/// the absence must be confirmed structurally or by the failure text.
pub fn should_remap_as_absent(health: &ServiceHealth, optional: bool, configured: bool) -> bool {
    if health.status != HealthStatus::Unhealthy || !(optional || !configured) {
        return false;
    }
    !configured || reason_signals_absence(&health.reason_text())
}

fn reason_signals_absence(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("not available") || text.contains("not configured")
}

struct AggregatorInner {
    registry: Arc<ProbeRegistry>,
    cache: Arc<StatusCache>,
    policy: ClassificationPolicy,
    metrics: Arc<dyn SystemMetricsSource>,
    settings: AggregatorSettings,
    started_at: Instant,
}

impl AggregatorInner {
    fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    async fn collect(&self, force: bool) -> AggregatedHealthStatus {
        let started = Instant::now();

        let (system, results) = tokio::join!(
            self.sample_system(),
            join_all(
                self.registry
                    .iter()
                    .map(|probe| async move { (probe.name.clone(), self.evaluate(probe, force).await) }),
            )
        );
        let services: BTreeMap<String, ServiceHealth> = results.into_iter().collect();

        let snapshot = AggregatedHealthStatus::assemble(
            services,
            system,
            self.uptime_seconds(),
            &self.policy,
        );
        self.cache.put_snapshot(snapshot.clone());

        debug!(
            "Health cycle finished in {:?}: overall={}, services={}",
            started.elapsed(),
            snapshot.overall(),
            snapshot.services.len()
        );
        snapshot
    }

    /// Host sampling reads `/proc`, so it runs on the blocking pool
    async fn sample_system(&self) -> SystemMetrics {
        let metrics = Arc::clone(&self.metrics);
        match tokio::task::spawn_blocking(move || metrics.sample()).await {
            Ok(system) => system,
            Err(e) => {
                warn!("System metrics sampling failed: {}", e);
                SystemMetrics::default()
            }
        }
    }

    async fn evaluate(&self, probe: &RegisteredProbe, force: bool) -> ServiceHealth {
        if !force {
            if let Some(health) = self.cache.get_fresh(&probe.name, probe.settings.reuse_window) {
                debug!("Reusing cached result for {}", probe.name);
                return health;
            }
        }

        let health = self.timed_check(probe).await;
        let health = self.remap_absent(probe, health);

        let (health, note) = if probe.settings.critical && health.status == HealthStatus::Unhealthy
        {
            self.reverify(probe, health).await
        } else {
            (health, None)
        };

        self.cache.put(&probe.name, health.clone(), note);
        health
    }

    async fn timed_check(&self, probe: &RegisteredProbe) -> ServiceHealth {
        let started = Instant::now();
        match timeout(probe.settings.timeout, probe.probe.check()).await {
            Ok(health) => health.ensure_explained(),
            Err(_) => {
                warn!(
                    "Health probe {} timed out after {:?}",
                    probe.name, probe.settings.timeout
                );
                ServiceHealth::timed_out(started.elapsed().as_millis() as u64)
            }
        }
    }

    fn remap_absent(&self, probe: &RegisteredProbe, health: ServiceHealth) -> ServiceHealth {
        let configured = probe.probe.is_configured();
        if !should_remap_as_absent(&health, probe.settings.optional, configured) {
            return health;
        }

        debug!("Treating {} as not configured", probe.name);
        ServiceHealth {
            status: HealthStatus::Healthy,
            details: Some(NOT_CONFIGURED_DETAILS.to_string()),
            error: None,
            ..health
        }
    }

    async fn reverify(
        &self,
        probe: &RegisteredProbe,
        failed: ServiceHealth,
    ) -> (ServiceHealth, Option<String>) {
        match timeout(self.settings.reverify_timeout, probe.probe.verify()).await {
            Ok(verified) if verified.status.is_operational() => {
                info!(
                    "Critical service {} recovered on re-verification ({})",
                    probe.name, verified.status
                );
                (verified, Some("reverified".to_string()))
            }
            Ok(_) => {
                warn!("Critical service {} confirmed unhealthy", probe.name);
                (failed, None)
            }
            Err(_) => {
                warn!(
                    "Re-verification of {} timed out after {:?}",
                    probe.name, self.settings.reverify_timeout
                );
                (failed, None)
            }
        }
    }

    fn fallback_snapshot(&self) -> AggregatedHealthStatus {
        let mut services: BTreeMap<String, ServiceHealth> = self
            .registry
            .iter()
            .map(|probe| {
                (
                    probe.name.clone(),
                    ServiceHealth::degraded(AGGREGATION_FAILED_DETAILS, 0),
                )
            })
            .collect();
        services.insert(API_SERVICE.to_string(), ServiceHealth::healthy(0));

        AggregatedHealthStatus::assemble(
            services,
            self.metrics.sample(),
            self.uptime_seconds(),
            &self.policy,
        )
    }
}

/// Produces aggregated health snapshots
///
/// Cloning is cheap and shares the cache, registry and deduplicators.
#[derive(Clone)]
pub struct HealthAggregator {
    inner: Arc<AggregatorInner>,
    on_demand: RequestDeduplicator<AggregatedHealthStatus>,
    forced: RequestDeduplicator<AggregatedHealthStatus>,
}

impl HealthAggregator {
    /// Create an aggregator over `registry`, writing into `cache`
    pub fn new(
        registry: ProbeRegistry,
        cache: Arc<StatusCache>,
        policy: ClassificationPolicy,
        metrics: Arc<dyn SystemMetricsSource>,
        settings: AggregatorSettings,
    ) -> Self {
        let ceiling = cache.hard_ceiling();
        let on_demand = RequestDeduplicator::new(settings.min_request_interval, ceiling);
        let forced = RequestDeduplicator::new(settings.min_request_interval, ceiling);

        Self {
            inner: Arc::new(AggregatorInner {
                registry: Arc::new(registry),
                cache,
                policy,
                metrics,
                settings,
                started_at: Instant::now(),
            }),
            on_demand,
            forced,
        }
    }

    /// Run a cycle, reusing cache entries inside each probe's reuse window
    pub async fn run_cycle(&self) -> AggregatedHealthStatus {
        self.cycle(false).await
    }

    /// Run a cycle that probes every service
    pub async fn refresh(&self) -> AggregatedHealthStatus {
        self.cycle(true).await
    }

    async fn cycle(&self, force: bool) -> AggregatedHealthStatus {
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.collect(force).await }).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Health aggregation failed: {}", e);
                self.inner.fallback_snapshot()
            }
        }
    }

    /// Current status for request handlers
    ///
    /// Serves a fresh cached snapshot, otherwise joins or starts a
    /// deduplicated cycle.
    pub async fn current_status(&self) -> AggregatedHealthStatus {
        if let Some(snapshot) = self.inner.cache.fresh_snapshot(self.inner.settings.snapshot_fresh)
        {
            return snapshot;
        }

        let this = self.clone();
        match self
            .on_demand
            .get_or_run(move || async move { this.run_cycle().await })
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Deduplicated health check failed, running directly: {}", e);
                self.run_cycle().await
            }
        }
    }

    /// Freshly probed status, deduplicated across concurrent callers
    pub async fn detailed_status(&self) -> AggregatedHealthStatus {
        let this = self.clone();
        match self
            .forced
            .get_or_run(move || async move { this.refresh().await })
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Deduplicated health refresh failed, running directly: {}", e);
                self.refresh().await
            }
        }
    }

    /// Probe one service and fold the result into the cached snapshot
    ///
    /// The snapshot is only touched while it is still trusted, and it keeps
    /// its original age.
    ///
    /// Returns `None` when the service is not registered or the check
    /// could not complete.
    pub async fn check_service(&self, name: &str) -> Option<ServiceHealth> {
        let probe = self.inner.registry.get(name)?.clone();
        let inner = Arc::clone(&self.inner);

        let health = match tokio::spawn(async move { inner.evaluate(&probe, true).await }).await {
            Ok(health) => health,
            Err(e) => {
                error!("Health check for {} failed: {}", name, e);
                return None;
            }
        };

        let policy = &self.inner.policy;
        let folded = self
            .inner
            .cache
            .update_trusted_snapshot(|snapshot| snapshot.with_service(name, health.clone(), policy));
        if !folded {
            debug!("No trusted snapshot to fold {} into", name);
        }
        Some(health)
    }

    /// Trusted cached snapshot, or an empty healthy one on cold start
    pub fn last_known_or_default(&self) -> AggregatedHealthStatus {
        self.inner
            .cache
            .trusted_snapshot()
            .unwrap_or_else(|| AggregatedHealthStatus::empty(self.uptime_seconds()))
    }

    /// Shared status cache
    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.inner.cache
    }

    /// Registered probes
    pub fn registry(&self) -> &ProbeRegistry {
        &self.inner.registry
    }

    /// Classification policy
    pub fn policy(&self) -> &ClassificationPolicy {
        &self.inner.policy
    }

    /// Seconds since the aggregator was created
    pub fn uptime_seconds(&self) -> u64 {
        self.inner.uptime_seconds()
    }

    /// Producer executions of the on-demand deduplicator
    pub fn on_demand_runs(&self) -> u64 {
        self.on_demand.runs()
    }
}

impl std::fmt::Debug for HealthAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthAggregator")
            .field("registry", &self.inner.registry)
            .field("settings", &self.inner.settings)
            .finish()
    }
}
