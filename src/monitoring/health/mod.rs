//! Health aggregation
//!
//! Probes feed the aggregator, which writes the shared status cache and
//! produces snapshots; the background monitor diffs consecutive snapshots
//! and hands changes to the realtime broadcaster.

pub mod aggregator;
pub mod cache;
pub mod change;
pub mod classify;
pub mod dedup;
pub mod monitor;
pub mod probe;
pub mod types;


pub use aggregator::{AggregatorSettings, HealthAggregator, should_remap_as_absent};
pub use cache::{CacheEntry, StatusCache};
pub use change::ChangeDetector;
pub use classify::{ClassificationPolicy, classify_overall};
pub use dedup::RequestDeduplicator;
pub use monitor::{BackgroundMonitor, CycleReport, MonitorSettings};
pub use probe::{ProbeRegistry, ProbeSettings, RegisteredProbe, ServiceHealthProbe};
pub use types::{
    AggregatedHealthStatus, ChangeSeverity, ChangeType, HealthChange, HealthStatus,
    ServiceHealth, SystemMetrics,
};
