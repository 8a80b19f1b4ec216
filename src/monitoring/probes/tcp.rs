//! TCP connect probe

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

use crate::monitoring::health::{ServiceHealth, ServiceHealthProbe};

/// Connect time above which the dependency is reported degraded
pub const DEFAULT_SLOW_CONNECT: Duration = Duration::from_millis(1_000);

/// Healthy when a TCP connection to `host:port` can be opened
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: String,
    slow_after: Duration,
}

impl TcpProbe {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            slow_after: DEFAULT_SLOW_CONNECT,
        }
    }

    pub fn with_slow_threshold(mut self, slow_after: Duration) -> Self {
        self.slow_after = slow_after;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl ServiceHealthProbe for TcpProbe {
    async fn check(&self) -> ServiceHealth {
        let started = Instant::now();
        match TcpStream::connect(&self.target).await {
            Ok(_stream) => {
                let elapsed = started.elapsed();
                let ms = elapsed.as_millis() as u64;
                debug!("Connected to {} in {}ms", self.target, ms);
                if elapsed > self.slow_after {
                    ServiceHealth::degraded(format!("slow connect to {}", self.target), ms)
                } else {
                    ServiceHealth::healthy(ms)
                }
            }
            Err(e) => ServiceHealth::unhealthy(
                format!("connection to {} failed: {}", self.target, e),
                started.elapsed().as_millis() as u64,
            ),
        }
    }
}
