//! Health check endpoints
//!
//! Both endpoints always answer 200; the body carries the status.

use crate::monitoring::health::AggregatedHealthStatus;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use tracing::debug;

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(health_check))
            .route("/detailed", web::get().to(detailed_health_check))
            .route("/ws", web::get().to(super::realtime::realtime_socket)),
    );
}

/// Basic health check endpoint
///
/// Serves the cached snapshot when fresh, otherwise joins or starts a
/// deduplicated aggregation cycle.
pub async fn health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");

    let snapshot = state.health.aggregator().current_status().await;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Detailed health check endpoint
///
/// Probes every service afresh and adds process metadata.
pub async fn detailed_health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Detailed health check requested");

    let snapshot = state.health.aggregator().detailed_status().await;
    let build = crate::build_info();
    let process = ProcessInfo {
        version: build.version,
        build_time: build.build_time,
        git_hash: build.git_hash,
        rust_version: build.rust_version,
        pid: std::process::id(),
        uptime_seconds: state.health.aggregator().uptime_seconds(),
        monitor_running: state.health.monitor().is_running(),
        monitor_cycles: state.health.monitor().cycles(),
        realtime_subscribers: state.health.broadcaster().subscriber_count(),
        total_requests: state.health.requests().total_requests(),
    };

    Ok(HttpResponse::Ok().json(DetailedHealth { snapshot, process }))
}

/// Snapshot plus process metadata
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealth {
    #[serde(flatten)]
    pub snapshot: AggregatedHealthStatus,
    pub process: ProcessInfo,
}

/// Process metadata
#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub version: &'static str,
    pub build_time: &'static str,
    pub git_hash: &'static str,
    pub rust_version: &'static str,
    pub pid: u32,
    pub uptime_seconds: u64,
    pub monitor_running: bool,
    pub monitor_cycles: u64,
    pub realtime_subscribers: usize,
    pub total_requests: u64,
}
