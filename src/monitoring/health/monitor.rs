//! Background health monitor
//!
//! Owns three periodic tasks: the full aggregation cycle, a fast loop for
//! the most critical dependency, and the realtime heartbeat. All of them
//! are aborted by `stop`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info, warn};

use super::aggregator::HealthAggregator;
use super::change::ChangeDetector;
use super::types::{AggregatedHealthStatus, HealthChange};
use crate::config::MonitoringConfig;
use crate::monitoring::realtime::{RealtimeBroadcaster, RealtimeEvent};

/// Monitor cadence and publication settings
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Full cycle cadence
    pub check_interval: Duration,
    /// Fast loop cadence
    pub critical_check_interval: Duration,
    /// Service polled by the fast loop
    pub critical_service: String,
    /// Heartbeat cadence
    pub heartbeat_interval: Duration,
    /// Publish a full snapshot at least every this many cycles
    pub snapshot_every_cycles: u64,
    /// Whether events are published at all
    pub realtime_enabled: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitoringConfig::default())
    }
}

impl From<&MonitoringConfig> for MonitorSettings {
    fn from(config: &MonitoringConfig) -> Self {
        Self {
            check_interval: config.health.check_interval(),
            critical_check_interval: config.health.critical_check_interval(),
            critical_service: config.health.critical_check_service.clone(),
            heartbeat_interval: config.realtime.heartbeat_interval(),
            snapshot_every_cycles: u64::from(config.realtime.snapshot_every_cycles.max(1)),
            realtime_enabled: config.realtime.enabled,
        }
    }
}

/// Result of one monitor cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Snapshot produced by the cycle
    pub snapshot: AggregatedHealthStatus,
    /// Changes against the previous cycle
    pub changes: Vec<HealthChange>,
    /// Whether a full `health:status` event was published
    pub published_snapshot: bool,
}

struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct MonitorShared {
    aggregator: HealthAggregator,
    broadcaster: Arc<RealtimeBroadcaster>,
    detector: Mutex<ChangeDetector>,
    settings: MonitorSettings,
    cycle_running: AtomicBool,
    cycles: AtomicU64,
}

impl MonitorShared {
    async fn run_once(&self) -> Option<CycleReport> {
        if self
            .cycle_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Previous health cycle still running, skipping this one");
            return None;
        }
        let _guard = CycleGuard(&self.cycle_running);

        let snapshot = self.aggregator.run_cycle().await;
        let changes = self.detector.lock().detect(&snapshot);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        for change in &changes {
            debug!("Health change: {}", change.message);
        }

        let published_snapshot = self.publish(&snapshot, &changes, cycle);
        Some(CycleReport {
            snapshot,
            changes,
            published_snapshot,
        })
    }

    fn publish(
        &self,
        snapshot: &AggregatedHealthStatus,
        changes: &[HealthChange],
        cycle: u64,
    ) -> bool {
        if !self.settings.realtime_enabled {
            return false;
        }

        let due = cycle == 1 || cycle % self.settings.snapshot_every_cycles == 0;
        let publish_snapshot = due || !changes.is_empty();
        if publish_snapshot {
            self.broadcaster.broadcast(RealtimeEvent::status(snapshot));
        }

        for change in changes {
            if let Some(health) = snapshot.services.get(&change.service) {
                self.broadcaster.broadcast(RealtimeEvent::service_update(
                    &change.service,
                    health,
                    change,
                ));
            }
        }

        publish_snapshot
    }

    async fn check_critical(&self) -> Option<HealthChange> {
        let name = &self.settings.critical_service;
        let previous = self
            .aggregator
            .cache()
            .get(name)
            .map(|entry| entry.health.status);

        let health = self.aggregator.check_service(name).await?;
        let change = match previous {
            Some(previous) if previous == health.status => return None,
            Some(previous) => HealthChange::status(name, previous, health.status),
            None => HealthChange::appeared(name, health.status),
        };

        info!("{}", change.message);
        self.detector.lock().observe_service(name, &health);
        if self.settings.realtime_enabled {
            self.broadcaster
                .broadcast(RealtimeEvent::service_update(name, &health, &change));
        }
        Some(change)
    }

    fn heartbeat(&self) {
        let snapshot = self.aggregator.last_known_or_default();
        let delivered = self.broadcaster.broadcast(RealtimeEvent::heartbeat(
            snapshot.overall(),
            self.aggregator.uptime_seconds(),
        ));
        debug!("Heartbeat delivered to {} subscribers", delivered);
    }
}

/// Periodic health monitor
pub struct BackgroundMonitor {
    shared: Arc<MonitorShared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundMonitor {
    /// Create a stopped monitor
    pub fn new(
        aggregator: HealthAggregator,
        broadcaster: Arc<RealtimeBroadcaster>,
        detector: ChangeDetector,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                aggregator,
                broadcaster,
                detector: Mutex::new(detector),
                settings,
                cycle_running: AtomicBool::new(false),
                cycles: AtomicU64::new(0),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the periodic tasks; a no-op while already running
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            warn!("Health monitor already running");
            return;
        }

        let settings = &self.shared.settings;
        info!(
            "Starting health monitor (cycle {:?}, critical {:?}, heartbeat {:?})",
            settings.check_interval, settings.critical_check_interval, settings.heartbeat_interval
        );

        let shared = Arc::clone(&self.shared);
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval(shared.settings.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                shared.run_once().await;
            }
        }));

        if self
            .shared
            .aggregator
            .registry()
            .get(&settings.critical_service)
            .is_some()
        {
            let shared = Arc::clone(&self.shared);
            tasks.push(tokio::spawn(async move {
                let period = shared.settings.critical_check_interval;
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    shared.check_critical().await;
                }
            }));
        } else {
            debug!(
                "Critical service {} not registered, fast loop disabled",
                settings.critical_service
            );
        }

        if settings.realtime_enabled {
            let shared = Arc::clone(&self.shared);
            tasks.push(tokio::spawn(async move {
                let period = shared.settings.heartbeat_interval;
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    shared.heartbeat();
                }
            }));
        }
    }

    /// Abort every task and wait for them to finish
    pub async fn stop(&self) {
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        if tasks.is_empty() {
            return;
        }

        info!("Stopping health monitor");
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Health monitor task ended abnormally: {}", e);
                }
            }
        }
        info!("Health monitor stopped");
    }

    /// Whether the periodic tasks are running
    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Run one guarded cycle; `None` when a cycle is already in progress
    pub async fn run_once(&self) -> Option<CycleReport> {
        self.shared.run_once().await
    }

    /// Run one fast-loop check; returns the change it published, if any
    pub async fn check_critical(&self) -> Option<HealthChange> {
        self.shared.check_critical().await
    }

    /// Completed full cycles
    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }

    /// Forget the change baseline
    pub fn reset_changes(&self) {
        self.shared.detector.lock().reset();
    }

    /// The aggregator driven by this monitor
    pub fn aggregator(&self) -> &HealthAggregator {
        &self.shared.aggregator
    }
}

impl Drop for BackgroundMonitor {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
