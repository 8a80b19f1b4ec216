//! Status cache
//!
//! Last-known health per service plus the latest full snapshot. Entries
//! are never evicted; they age out logically and are only dropped by
//! `clear` on shutdown.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::time::{Duration, Instant};

use super::types::{AggregatedHealthStatus, ServiceHealth};

/// Cached result for one service
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Last probe result
    pub health: ServiceHealth,
    /// When the entry was written
    pub stored_at: Instant,
    /// Free-form note from the writer (e.g. "reverified")
    pub details: Option<String>,
}

impl CacheEntry {
    /// Age of the entry
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

#[derive(Debug, Clone)]
struct SnapshotSlot {
    snapshot: AggregatedHealthStatus,
    stored_at: Instant,
}

/// Shared per-service status cache
///
/// Writes are last-writer-wins; different service names may be written
/// concurrently from background and on-demand cycles.
#[derive(Debug)]
pub struct StatusCache {
    entries: DashMap<String, CacheEntry>,
    snapshot: RwLock<Option<SnapshotSlot>>,
    hard_ceiling: Duration,
}

impl StatusCache {
    /// Create a cache whose values are never trusted beyond `hard_ceiling`
    pub fn new(hard_ceiling: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            snapshot: RwLock::new(None),
            hard_ceiling,
        }
    }

    /// Get the entry for a service
    pub fn get(&self, service: &str) -> Option<CacheEntry> {
        self.entries.get(service).map(|entry| entry.value().clone())
    }

    /// Overwrite the entry for a service, timestamped now
    pub fn put(&self, service: &str, health: ServiceHealth, details: Option<String>) {
        self.entries.insert(
            service.to_string(),
            CacheEntry {
                health,
                stored_at: Instant::now(),
                details,
            },
        );
    }

    /// Whether an entry is younger than `max_age`
    pub fn is_fresh(&self, entry: &CacheEntry, max_age: Duration) -> bool {
        entry.age() < max_age.min(self.hard_ceiling)
    }

    /// Health of a service if its entry is fresh
    pub fn get_fresh(&self, service: &str, max_age: Duration) -> Option<ServiceHealth> {
        self.get(service)
            .filter(|entry| self.is_fresh(entry, max_age))
            .map(|entry| entry.health)
    }

    /// Store the latest snapshot
    pub fn put_snapshot(&self, snapshot: AggregatedHealthStatus) {
        *self.snapshot.write() = Some(SnapshotSlot {
            snapshot,
            stored_at: Instant::now(),
        });
    }

    /// Rewrite the latest snapshot in place while it is still trusted
    ///
    /// The slot keeps its original age. Returns `false` when there is no
    /// snapshot or it is past the hard ceiling.
    pub fn update_trusted_snapshot<F>(&self, update: F) -> bool
    where
        F: FnOnce(AggregatedHealthStatus) -> AggregatedHealthStatus,
    {
        let mut slot = self.snapshot.write();
        match slot.as_mut() {
            Some(slot) if slot.stored_at.elapsed() < self.hard_ceiling => {
                slot.snapshot = update(slot.snapshot.clone());
                true
            }
            _ => false,
        }
    }

    /// Latest snapshot with its age, however old
    pub fn latest_snapshot(&self) -> Option<(AggregatedHealthStatus, Duration)> {
        self.snapshot
            .read()
            .as_ref()
            .map(|slot| (slot.snapshot.clone(), slot.stored_at.elapsed()))
    }

    /// Latest snapshot if younger than `max_age`
    pub fn fresh_snapshot(&self, max_age: Duration) -> Option<AggregatedHealthStatus> {
        let limit = max_age.min(self.hard_ceiling);
        self.latest_snapshot()
            .filter(|(_, age)| *age < limit)
            .map(|(snapshot, _)| snapshot)
    }

    /// Latest snapshot if still within the hard ceiling
    pub fn trusted_snapshot(&self) -> Option<AggregatedHealthStatus> {
        self.fresh_snapshot(self.hard_ceiling)
    }

    /// The hard ceiling this cache enforces
    pub fn hard_ceiling(&self) -> Duration {
        self.hard_ceiling
    }

    /// Number of cached services
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (shutdown, tests)
    pub fn clear(&self) {
        self.entries.clear();
        *self.snapshot.write() = None;
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::health::classify::ClassificationPolicy;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[test]
    fn test_put_and_get() {
        let cache = StatusCache::default();
        assert!(cache.get("database").is_none());

        cache.put("database", ServiceHealth::healthy(12), None);
        let entry = cache.get("database").unwrap();
        assert_eq!(entry.health.response_time_ms, 12);
        assert!(cache.is_fresh(&entry, Duration::from_secs(15)));

        cache.put(
            "database",
            ServiceHealth::unhealthy("refused", 3),
            Some("reverified".to_string()),
        );
        let entry = cache.get("database").unwrap();
        assert_eq!(entry.details.as_deref(), Some("reverified"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_freshness_respects_max_age() {
        let cache = StatusCache::default();
        cache.put("queue", ServiceHealth::healthy(5), None);
        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get_fresh("queue", Duration::from_millis(5)).is_none());
        assert!(cache.get_fresh("queue", Duration::from_secs(5)).is_some());
    }

    #[test]
    fn test_hard_ceiling_caps_freshness() {
        let cache = StatusCache::new(Duration::from_millis(10));
        cache.put("queue", ServiceHealth::healthy(5), None);
        cache.put_snapshot(AggregatedHealthStatus::empty(0));
        std::thread::sleep(Duration::from_millis(25));

        // A generous window does not extend trust past the ceiling
        assert!(cache.get_fresh("queue", Duration::from_secs(60)).is_none());
        assert!(cache.fresh_snapshot(Duration::from_secs(60)).is_none());
        assert!(cache.trusted_snapshot().is_none());
        assert!(cache.latest_snapshot().is_some());
    }

    #[test]
    fn test_update_keeps_snapshot_age() {
        let cache = StatusCache::new(Duration::from_millis(40));
        assert!(!cache.update_trusted_snapshot(|snapshot| snapshot));

        cache.put_snapshot(AggregatedHealthStatus::empty(1));
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.update_trusted_snapshot(|mut snapshot| {
            snapshot.uptime_seconds = 7;
            snapshot
        }));
        assert_eq!(cache.trusted_snapshot().unwrap().uptime_seconds, 7);

        // Trust still runs from the original write
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.trusted_snapshot().is_none());
        assert!(!cache.update_trusted_snapshot(|snapshot| snapshot));
        assert_eq!(cache.latest_snapshot().unwrap().0.uptime_seconds, 7);
    }

    #[test]
    fn test_snapshot_slot() {
        let cache = StatusCache::default();
        assert!(cache.trusted_snapshot().is_none());

        let mut services = BTreeMap::new();
        services.insert("database".to_string(), ServiceHealth::healthy(4));
        let snapshot = AggregatedHealthStatus::assemble(
            services,
            Default::default(),
            42,
            &ClassificationPolicy::default(),
        );
        cache.put_snapshot(snapshot);

        let trusted = cache.trusted_snapshot().unwrap();
        assert_eq!(trusted.uptime_seconds, 42);

        cache.clear();
        assert!(cache.latest_snapshot().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_writes_to_distinct_services() {
        let cache = Arc::new(StatusCache::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        cache.put(&format!("service-{}", i), ServiceHealth::healthy(j), None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8);
        for i in 0..8 {
            let entry = cache.get(&format!("service-{}", i)).unwrap();
            assert_eq!(entry.health.response_time_ms, 99);
        }
    }
}
