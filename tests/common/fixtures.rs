//! Test fixtures
//!
//! Probes here are real implementations of the probe contract whose answer
//! is set by the test.

use async_trait::async_trait;
use healthcast::Config;
use healthcast::monitoring::HealthSystem;
use healthcast::monitoring::health::{
    HealthStatus, ProbeRegistry, ProbeSettings, ServiceHealth, ServiceHealthProbe,
    SystemMetrics,
};
use healthcast::monitoring::metrics::FixedMetricsSource;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Probe answering with whatever status was last set
pub struct ScriptedProbe {
    status: RwLock<HealthStatus>,
    response_time_ms: RwLock<u64>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(status: HealthStatus) -> Arc<Self> {
        Self::build(status, Duration::ZERO)
    }

    /// Probe that sleeps before answering
    pub fn slow(status: HealthStatus, delay: Duration) -> Arc<Self> {
        Self::build(status, delay)
    }

    fn build(status: HealthStatus, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status: RwLock::new(status),
            response_time_ms: RwLock::new(5),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, status: HealthStatus) {
        *self.status.write() = status;
    }

    pub fn set_response_time(&self, ms: u64) {
        *self.response_time_ms.write() = ms;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceHealthProbe for ScriptedProbe {
    async fn check(&self) -> ServiceHealth {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let ms = *self.response_time_ms.read();
        match *self.status.read() {
            HealthStatus::Healthy => ServiceHealth::healthy(ms),
            HealthStatus::Degraded => ServiceHealth::degraded("slow responses", ms),
            HealthStatus::Unhealthy => ServiceHealth::unhealthy("connection refused", ms),
        }
    }
}

/// Default configuration with intervals short enough for tests
///
/// Reuse windows are zero so every cycle probes again.
pub fn test_config() -> Config {
    let mut config = Config::default();
    let health = &mut config.app.monitoring.health;
    health.check_interval_ms = 50;
    health.critical_check_interval_ms = 25;
    health.reuse_window_ms = 0;
    health.snapshot_fresh_ms = 0;
    health.min_request_interval_ms = 0;
    health.reverify_timeout_ms = 100;
    config.app.monitoring.realtime.heartbeat_interval_ms = 1_000;
    config.app.monitoring.realtime.snapshot_every_cycles = 3;
    config
}

/// Probe settings that never reuse a cached result
pub fn no_reuse() -> ProbeSettings {
    ProbeSettings::default()
        .with_timeout(Duration::from_millis(500))
        .with_reuse_window(Duration::ZERO)
}

/// Health system over the given registry with quiet system metrics
pub fn health_system(config: &Config, registry: ProbeRegistry) -> HealthSystem {
    HealthSystem::with_registry(
        config,
        registry,
        Arc::new(FixedMetricsSource::new(SystemMetrics::default())),
    )
}
