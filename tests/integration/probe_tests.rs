//! Built-in probe integration tests
//!
//! HTTP probes run against a wiremock server; TCP probes against a local
//! listener.

#[cfg(test)]
mod tests {
    use crate::assert_ok;
    use healthcast::Config;
    use healthcast::config::{ProbeConfig, ProbeKind};
    use healthcast::monitoring::HealthSystem;
    use healthcast::monitoring::health::{HealthStatus, ServiceHealthProbe};
    use healthcast::monitoring::probes::{HttpProbe, TcpProbe};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_answering(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    fn probe_for(server: &MockServer, timeout: Duration) -> HttpProbe {
        assert_ok!(HttpProbe::new(format!("{}/health", server.uri()), timeout))
    }

    #[tokio::test]
    async fn test_http_probe_success() {
        let server = server_answering(200).await;
        let health = probe_for(&server, Duration::from_secs(2)).check().await;

        assert_eq!(health.status, HealthStatus::Healthy);
        let metrics = health.metrics.unwrap();
        assert_eq!(metrics["status_code"], 200);
    }

    #[tokio::test]
    async fn test_http_probe_server_error_is_unhealthy() {
        let server = server_answering(503).await;
        let health = probe_for(&server, Duration::from_secs(2)).check().await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.error.as_deref(), Some("HTTP 503"));
    }

    #[tokio::test]
    async fn test_http_probe_client_error_is_degraded() {
        let server = server_answering(404).await;
        let health = probe_for(&server, Duration::from_secs(2)).check().await;

        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_http_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let health = probe_for(&server, Duration::from_millis(50)).check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_tcp_probe_against_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let health = TcpProbe::new(addr.to_string()).check().await;
        assert_eq!(health.status, HealthStatus::Healthy);

        drop(listener);
        let health = TcpProbe::new(addr.to_string()).check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.error.unwrap().contains(&addr.to_string()));
    }

    fn config_with_http_probe(url: String, critical: bool) -> Config {
        let mut config = Config::default();
        let mut probe = ProbeConfig::new("search", ProbeKind::Http).with_target(&url);
        probe.critical = critical;
        probe.timeout_ms = Some(500);
        config.app.probes = vec![
            probe,
            ProbeConfig::new("communication", ProbeKind::Unconfigured).optional(),
        ];
        config.app.monitoring.health.reverify_timeout_ms = 200;
        // Host load must not influence the verdict
        config.app.monitoring.metrics.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_configured_http_probe_drives_overall() {
        let server = server_answering(200).await;
        let config = config_with_http_probe(format!("{}/health", server.uri()), true);
        let system = assert_ok!(HealthSystem::new(&config));

        let snapshot = system.aggregator().refresh().await;
        assert_eq!(snapshot.overall(), HealthStatus::Healthy);
        assert_eq!(snapshot.services["search"].status, HealthStatus::Healthy);

        let communication = &snapshot.services["communication"];
        assert_eq!(communication.status, HealthStatus::Healthy);
        assert_eq!(communication.details.as_deref(), Some("not configured"));
    }

    #[tokio::test]
    async fn test_failing_critical_http_probe_makes_system_unhealthy() {
        let server = server_answering(500).await;
        let config = config_with_http_probe(format!("{}/health", server.uri()), true);
        let system = assert_ok!(HealthSystem::new(&config));

        let snapshot = system.aggregator().refresh().await;
        assert_eq!(snapshot.services["search"].status, HealthStatus::Unhealthy);
        assert_eq!(snapshot.overall(), HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_failing_non_critical_http_probe_degrades() {
        let server = server_answering(500).await;
        let config = config_with_http_probe(format!("{}/health", server.uri()), false);
        let system = assert_ok!(HealthSystem::new(&config));

        let snapshot = system.aggregator().refresh().await;
        assert_eq!(snapshot.overall(), HealthStatus::Degraded);
    }
}
