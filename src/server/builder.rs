//! Server builder and run_server function
//!
//! `run_server` loads the configuration file when present, layers the
//! `HEALTHCAST_*` environment on top and serves until shutdown.

use crate::config::Config;
use crate::monitoring::HealthSystem;
use crate::server::server::HttpServer;
use crate::utils::error::{HealthcastError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/healthcast.yaml";

/// Server builder for easier configuration
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    health: Option<HealthSystem>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Serve an existing health system instead of building one from probes
    pub fn with_health(mut self, health: HealthSystem) -> Self {
        self.health = Some(health);
        self
    }

    /// Build the HTTP server
    pub fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| HealthcastError::config("Configuration is required"))?;
        config.validate()?;

        match self.health {
            Some(health) => Ok(HttpServer::with_health(&config, health)),
            None => HttpServer::new(&config),
        }
    }
}

/// Load the configuration file, falling back to the environment alone
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No configuration file at {:?}, using defaults and environment", path);
        return Config::from_env();
    }

    let mut config = Config::from_file(path).await?;
    config.apply_env_overrides(std::env::vars())?;
    config.validate()?;
    Ok(config)
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> Result<()> {
    info!("Starting healthcast {}", crate::VERSION);

    let server = ServerBuilder::new().with_config(config).build()?;
    let registered = server.state().health.aggregator().registry().names();
    if registered.is_empty() {
        warn!("No probes registered; only the api entry will be reported");
    }
    info!(
        "Serving http://{} with probes: {}",
        server.config().address(),
        registered.join(", ")
    );
    info!("   GET /health - Current status");
    info!("   GET /health/detailed - Fresh status with process details");
    info!("   GET /health/ws - Realtime channel");

    server.start().await
}
