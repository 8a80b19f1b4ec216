//! Configuration data models
//!
//! This module defines all configuration structures used by the service.

#![allow(missing_docs)]

pub mod app;
pub mod logging;
pub mod monitoring;
pub mod probe;
pub mod server;

// Re-export all configuration types
pub use app::*;
pub use logging::*;
pub use monitoring::*;
pub use probe::*;
pub use server::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    3000
}

pub fn default_true() -> bool {
    true
}

pub fn default_cors_max_age() -> u64 {
    3600
}

pub fn default_check_interval_ms() -> u64 {
    20_000
}

pub fn default_critical_check_interval_ms() -> u64 {
    10_000
}

pub fn default_critical_check_service() -> String {
    "database".to_string()
}

pub fn default_reuse_window_ms() -> u64 {
    15_000
}

pub fn default_snapshot_fresh_ms() -> u64 {
    20_000
}

pub fn default_hard_ceiling_ms() -> u64 {
    30_000
}

pub fn default_min_request_interval_ms() -> u64 {
    1_000
}

pub fn default_reverify_timeout_ms() -> u64 {
    2_000
}

pub fn default_regression_factor() -> f64 {
    1.5
}

pub fn default_room() -> String {
    "health-updates".to_string()
}

pub fn default_heartbeat_interval_ms() -> u64 {
    15_000
}

pub fn default_channel_capacity() -> usize {
    256
}

pub fn default_snapshot_every_cycles() -> u32 {
    3
}

pub fn default_metrics_window_secs() -> u64 {
    60
}

pub fn default_log_level() -> String {
    "info".to_string()
}
