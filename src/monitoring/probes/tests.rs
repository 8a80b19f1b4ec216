//! Tests for built-in probes

use super::*;
use crate::config::{Config, ProbeConfig, ProbeKind, RealtimeConfig};
use crate::monitoring::health::{HealthStatus, ServiceHealthProbe, StatusCache};
use crate::monitoring::metrics::RequestMetricsCollector;
use crate::monitoring::realtime::RealtimeBroadcaster;
use std::sync::Arc;
use std::time::Duration;

fn deps() -> ProbeDependencies {
    ProbeDependencies {
        requests: Arc::new(RequestMetricsCollector::default()),
        broadcaster: Arc::new(RealtimeBroadcaster::new(
            Arc::new(StatusCache::default()),
            &RealtimeConfig::default(),
        )),
    }
}

#[tokio::test]
async fn test_tcp_probe_connects() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let health = TcpProbe::new(address).check().await;
    assert_eq!(health.status, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_tcp_probe_reports_refusal() {
    // Bind then drop to get a port nobody listens on
    let address = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let health = TcpProbe::new(address).check().await;
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(health.error.unwrap().contains("failed"));
}

#[tokio::test]
async fn test_unconfigured_probe() {
    let probe = UnconfiguredProbe::new("communication");
    assert!(!probe.is_configured());
    let health = probe.check().await;
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(health.error.as_deref(), Some("communication not configured"));
}

#[tokio::test]
async fn test_api_probe_reports_error_rate() {
    let requests = Arc::new(RequestMetricsCollector::default());
    let probe = ApiProbe::new(requests.clone(), 10.0);
    assert_eq!(probe.check().await.status, HealthStatus::Healthy);

    requests.record_request(200);
    requests.record_request(500);
    let health = probe.check().await;
    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(health.metrics.unwrap().contains_key("error_rate"));
}

#[tokio::test]
async fn test_realtime_probe_counts_subscribers() {
    let deps = deps();
    let _subscription = deps.broadcaster.subscribe(None);

    let health = RealtimeProbe::new(&deps.broadcaster, true).check().await;
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.metrics.unwrap()["subscribers"], 1);

    let disabled = RealtimeProbe::new(&deps.broadcaster, false);
    assert!(!disabled.is_configured());
    assert_eq!(disabled.check().await.status, HealthStatus::Unhealthy);
}

#[test]
fn test_default_registry() {
    let config = Config::default();
    let registry = build_registry(&config, &deps()).unwrap();

    assert_eq!(registry.len(), 7);
    let mut critical = registry.critical_services();
    critical.sort();
    assert_eq!(critical, vec!["cache".to_string(), "database".to_string()]);

    let database = registry.get("database").unwrap();
    assert_eq!(database.settings.timeout, Duration::from_secs(5));
    let logger = registry.get("logger").unwrap();
    assert_eq!(logger.settings.timeout, Duration::from_secs(2));
    let communication = registry.get("communication").unwrap();
    assert!(communication.settings.optional);
    assert!(!communication.probe.is_configured());

    let policy = classification_policy(&config, &registry);
    assert!(policy.is_critical("database"));
    assert!(!policy.is_critical("queue"));
}

#[test]
fn test_probe_overrides() {
    let mut config = Config::default();
    config.app.probes = vec![ProbeConfig {
        reuse_window_ms: Some(500),
        timeout_ms: Some(750),
        ..ProbeConfig::new("mailer", ProbeKind::Http).with_target("http://127.0.0.1:8025/health")
    }];

    let registry = build_registry(&config, &deps()).unwrap();
    let mailer = registry.get("mailer").unwrap();
    assert_eq!(mailer.settings.timeout, Duration::from_millis(750));
    assert_eq!(mailer.settings.reuse_window, Duration::from_millis(500));
}

#[test]
fn test_missing_target_is_rejected() {
    let mut config = Config::default();
    config.app.probes = vec![ProbeConfig::new("database", ProbeKind::Tcp)];
    assert!(build_registry(&config, &deps()).is_err());
}
