//! HTTP route integration tests

#[cfg(test)]
mod tests {
    use crate::common::{ScriptedProbe, health_system, no_reuse, test_config};
    use actix_web::http::{StatusCode, header};
    use actix_web::{test, web};
    use healthcast::Config;
    use healthcast::monitoring::health::{HealthStatus, ProbeRegistry};
    use healthcast::server::{AppState, HttpServer};
    use std::sync::Arc;

    fn state_with(config: Config, database: &Arc<ScriptedProbe>) -> web::Data<AppState> {
        let registry =
            ProbeRegistry::new().with("database", database.clone(), no_reuse().critical());
        let health = health_system(&config, registry);
        web::Data::new(AppState::new(config, health))
    }

    #[actix_web::test]
    async fn test_health_follows_probe_state() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(
            test_config(),
            &database,
        )))
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["overall"], "healthy");
        assert!(body["system"]["cpu_percent"].is_number());
        assert!(body["uptime_seconds"].is_u64());

        database.set(HealthStatus::Unhealthy);
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        // Status lives in the body; the endpoint itself answers 200
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["overall"], "unhealthy");
        assert_eq!(body["services"]["database"]["error"], "connection refused");
    }

    #[actix_web::test]
    async fn test_health_serves_fresh_snapshot_without_probing() {
        let mut config = test_config();
        config.app.monitoring.health.snapshot_fresh_ms = 10_000;
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(config, &database))).await;

        for _ in 0..5 {
            let req = test::TestRequest::get().uri("/health").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(database.calls(), 1);
    }

    #[actix_web::test]
    async fn test_detailed_probes_every_time() {
        let mut config = test_config();
        config.app.monitoring.health.snapshot_fresh_ms = 10_000;
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(config, &database))).await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/health/detailed").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["services"]["database"]["status"], "healthy");
            assert_eq!(body["process"]["version"], healthcast::VERSION);
        }
        assert_eq!(database.calls(), 2);
    }

    #[actix_web::test]
    async fn test_cors_preflight() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(
            test_config(),
            &database,
        )))
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/health")
            .insert_header((header::ORIGIN, "https://status.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(
            resp.headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[actix_web::test]
    async fn test_websocket_upgrade() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(
            test_config(),
            &database,
        )))
        .await;

        let req = test::TestRequest::get()
            .uri("/health/ws")
            .insert_header((header::UPGRADE, "websocket"))
            .insert_header((header::CONNECTION, "upgrade"))
            .insert_header((header::SEC_WEBSOCKET_VERSION, "13"))
            .insert_header((header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ=="))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SWITCHING_PROTOCOLS);
    }

    #[actix_web::test]
    async fn test_websocket_without_upgrade_headers_is_rejected() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let app = test::init_service(HttpServer::create_app(state_with(
            test_config(),
            &database,
        )))
        .await;

        let req = test::TestRequest::get().uri("/health/ws").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }
}
