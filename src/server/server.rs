//! HTTP server core implementation

use crate::config::{Config, ServerConfig};
use crate::monitoring::HealthSystem;
use crate::server::middleware::MetricsMiddleware;
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{HealthcastError, Result};
use actix_cors::Cors;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with probes built from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");
        let health = HealthSystem::new(config)?;
        Ok(Self::with_health(config, health))
    }

    /// Create a server around an existing health system
    pub fn with_health(config: &Config, health: HealthSystem) -> Self {
        Self {
            config: config.server().clone(),
            state: AppState::new(config.clone(), health),
        }
    }

    fn cors(config: &ServerConfig) -> Cors {
        let cors_config = &config.cors;
        if !cors_config.enabled {
            return Cors::default();
        }

        let cors = if cors_config.allows_all_origins() {
            Cors::default().allow_any_origin()
        } else {
            cors_config
                .allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        };
        cors.allowed_methods(vec!["GET", "OPTIONS"])
            .allow_any_header()
            .max_age(cors_config.max_age as usize)
    }

    /// Create the Actix-web application
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let cors = Self::cors(state.config.server());

        App::new()
            .app_data(state)
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "healthcast")))
            .configure(routes::configure_routes)
    }

    /// Start monitoring and serve until a shutdown signal arrives
    ///
    /// Shutdown order: stop accepting and drain HTTP, then stop the
    /// monitor, then clear the status cache.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let port = self.config.port;
        let workers = self.config.worker_count();

        info!("Starting HTTP server on {} with {} workers", bind_addr, workers);

        let health = self.state.health.clone();
        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .workers(workers)
            .disable_signals()
            .bind(&bind_addr)
            .map_err(|e| Self::format_bind_error(e, &bind_addr, port))?
            .run();
        let handle = server.handle();

        health.start();
        info!("HTTP server listening on {}", bind_addr);

        let server_task = tokio::spawn(server);
        Self::shutdown_signal().await;

        handle.stop(true).await;
        match server_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("HTTP server exited with error: {}", e),
            Err(e) => warn!("HTTP server task failed: {}", e),
        }

        health.stop().await;
        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Wait for Ctrl+C or SIGTERM
    pub async fn shutdown_signal() {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal, shutting down gracefully"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                    info!("Received terminate signal, shutting down gracefully");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    /// Turn a bind failure into an actionable message
    pub(crate) fn format_bind_error(
        error: std::io::Error,
        bind_addr: &str,
        port: u16,
    ) -> HealthcastError {
        match error.kind() {
            std::io::ErrorKind::AddrInUse => HealthcastError::server(format!(
                "Port {} is already in use; pick another with --port {} or HEALTHCAST_PORT={}",
                port,
                port.saturating_add(1),
                port.saturating_add(1)
            )),
            std::io::ErrorKind::PermissionDenied => HealthcastError::server(format!(
                "Permission denied for port {}; use a port >= 1024",
                port
            )),
            _ => HealthcastError::server(format!("Failed to bind to {}: {}", bind_addr, error)),
        }
    }
}
