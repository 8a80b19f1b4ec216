//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::monitoring::HealthSystem;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Cloned into every actix worker; all fields are cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Health aggregation, monitor and realtime channel
    pub health: HealthSystem,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config, health: HealthSystem) -> Self {
        Self {
            config: Arc::new(config),
            health,
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
