//! HTTP GET probe

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

use crate::monitoring::health::{ServiceHealth, ServiceHealthProbe};
use crate::utils::error::{HealthcastError, Result};

/// Healthy on a 2xx answer, unhealthy on 5xx or transport failure,
/// degraded on anything else
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    /// Create a probe whose requests give up after `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("healthcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HealthcastError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ServiceHealthProbe for HttpProbe {
    async fn check(&self) -> ServiceHealth {
        let started = Instant::now();
        let result = self.client.get(&self.url).send().await;
        let ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    ServiceHealth::healthy(ms).with_metric("status_code", status.as_u16())
                } else if status.is_server_error() {
                    ServiceHealth::unhealthy(format!("HTTP {}", status.as_u16()), ms)
                        .with_metric("status_code", status.as_u16())
                } else {
                    ServiceHealth::degraded(format!("HTTP {}", status.as_u16()), ms)
                        .with_metric("status_code", status.as_u16())
                }
            }
            Err(e) if e.is_timeout() => ServiceHealth::timed_out(ms),
            Err(e) => ServiceHealth::unhealthy(format!("request to {} failed: {}", self.url, e), ms),
        }
    }
}
