//! In-process probes

use async_trait::async_trait;
use std::sync::{Arc, Weak};

use crate::monitoring::health::{ServiceHealth, ServiceHealthProbe};
use crate::monitoring::metrics::RequestMetricsCollector;
use crate::monitoring::realtime::RealtimeBroadcaster;

/// The service's own HTTP layer
///
/// Reports request figures; degraded while the windowed error rate is at
/// or above `error_rate_limit`.
#[derive(Debug, Clone)]
pub struct ApiProbe {
    requests: Arc<RequestMetricsCollector>,
    error_rate_limit: f64,
}

impl ApiProbe {
    pub fn new(requests: Arc<RequestMetricsCollector>, error_rate_limit: f64) -> Self {
        Self {
            requests,
            error_rate_limit,
        }
    }
}

#[async_trait]
impl ServiceHealthProbe for ApiProbe {
    async fn check(&self) -> ServiceHealth {
        let stats = self.requests.stats();
        let health = if stats.error_rate >= self.error_rate_limit {
            ServiceHealth::degraded(format!("error rate at {:.1}%", stats.error_rate), 0)
        } else {
            ServiceHealth::healthy(0)
        };
        health
            .with_metric("request_rate", stats.request_rate)
            .with_metric("error_rate", stats.error_rate)
            .with_metric("active_connections", stats.active_connections)
    }
}

/// The tracing pipeline
#[derive(Debug, Clone, Default)]
pub struct LoggerProbe;

#[async_trait]
impl ServiceHealthProbe for LoggerProbe {
    async fn check(&self) -> ServiceHealth {
        if tracing::dispatcher::has_been_set() {
            ServiceHealth::healthy(0)
        } else {
            ServiceHealth::degraded("no global tracing subscriber installed", 0)
        }
    }
}

/// The realtime broadcast layer
///
/// Holds the broadcaster weakly so a registry never keeps it alive.
#[derive(Debug, Clone)]
pub struct RealtimeProbe {
    broadcaster: Weak<RealtimeBroadcaster>,
    enabled: bool,
}

impl RealtimeProbe {
    pub fn new(broadcaster: &Arc<RealtimeBroadcaster>, enabled: bool) -> Self {
        Self {
            broadcaster: Arc::downgrade(broadcaster),
            enabled,
        }
    }
}

#[async_trait]
impl ServiceHealthProbe for RealtimeProbe {
    async fn check(&self) -> ServiceHealth {
        if !self.enabled {
            return ServiceHealth::unhealthy("realtime channel not configured", 0);
        }
        match self.broadcaster.upgrade() {
            Some(broadcaster) => ServiceHealth::healthy(0)
                .with_metric("subscribers", broadcaster.subscriber_count())
                .with_metric("rooms", broadcaster.rooms().len()),
            None => ServiceHealth::unhealthy("realtime broadcaster is gone", 0),
        }
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }
}

/// Placeholder for a dependency absent from this deployment
#[derive(Debug, Clone)]
pub struct UnconfiguredProbe {
    name: String,
}

impl UnconfiguredProbe {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ServiceHealthProbe for UnconfiguredProbe {
    async fn check(&self) -> ServiceHealth {
        ServiceHealth::unhealthy(format!("{} not configured", self.name), 0)
    }

    fn is_configured(&self) -> bool {
        false
    }
}
