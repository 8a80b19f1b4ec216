//! Error handling for healthcast
//!
//! Probe failures never surface as errors: they are folded into
//! `ServiceHealth` results. The variants below cover the plumbing around
//! the health core (configuration, server lifecycle, websocket upgrades,
//! the request deduplicator).

#![allow(missing_docs)]

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for healthcast
pub type Result<T> = std::result::Result<T, HealthcastError>;

/// Main error type for healthcast
#[derive(Error, Debug)]
pub enum HealthcastError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server lifecycle errors
    #[error("Server error: {0}")]
    Server(String),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Request deduplication errors
    #[error("Deduplication error: {0}")]
    Dedup(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HealthcastError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Create a websocket error
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket(message.into())
    }

    /// Create a deduplication error
    pub fn dedup(message: impl Into<String>) -> Self {
        Self::Dedup(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            HealthcastError::Config(_) => "CONFIG_ERROR",
            HealthcastError::Serialization(_) => "SERIALIZATION_ERROR",
            HealthcastError::Yaml(_) => "YAML_ERROR",
            HealthcastError::Io(_) => "IO_ERROR",
            HealthcastError::Server(_) => "SERVER_ERROR",
            HealthcastError::WebSocket(_) => "WEBSOCKET_ERROR",
            HealthcastError::Dedup(_) => "DEDUP_ERROR",
            HealthcastError::Timeout(_) => "TIMEOUT",
            HealthcastError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for HealthcastError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            HealthcastError::WebSocket(_) => actix_web::http::StatusCode::BAD_REQUEST,
            HealthcastError::Timeout(_) => actix_web::http::StatusCode::REQUEST_TIMEOUT,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let message = match self {
            HealthcastError::WebSocket(_)
            | HealthcastError::Timeout(_)
            | HealthcastError::Config(_)
            | HealthcastError::Server(_) => self.to_string(),
            _ => "An internal error occurred".to_string(),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}
