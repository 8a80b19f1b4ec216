//! # healthcast
//!
//! Dependency health aggregation with cached status snapshots and realtime
//! change broadcasting.
//!
//! ## Features
//!
//! - **Probe registry**: one async probe per dependency, each with its own
//!   timeout, criticality and reuse window
//! - **Aggregation**: concurrent probing folded into one snapshot with a
//!   derived overall status; concurrent callers share one cycle
//! - **Status cache**: per-service results and the latest snapshot, bounded
//!   by a hard staleness ceiling
//! - **Background monitor**: periodic and fast critical-service cycles with
//!   change detection
//! - **Realtime channel**: room-based websocket fan-out of compact payloads
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use healthcast::{Config, HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/healthcast.yaml").await?;
//!     let server = HttpServer::new(&config)?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod monitoring;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use monitoring::HealthSystem;
pub use monitoring::health::{AggregatedHealthStatus, HealthStatus, ServiceHealth};
pub use server::HttpServer;
pub use utils::error::{HealthcastError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp (seconds since the epoch)
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: env!("BUILD_TIME"),
            git_hash: env!("GIT_HASH"),
            rust_version: env!("RUST_VERSION"),
        }
    }
}

/// Build information captured by the build script
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.version, VERSION);
        assert!(!info.git_hash.is_empty());
        assert!(!info.build_time.is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "healthcast");
        assert_eq!(DESCRIPTION, env!("CARGO_PKG_DESCRIPTION"));
    }
}
