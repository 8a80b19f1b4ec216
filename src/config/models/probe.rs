//! Probe configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a dependency is probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// TCP connect to `host:port`
    Tcp,
    /// HTTP GET expecting a 2xx
    Http,
    /// The service's own HTTP layer
    Api,
    /// The tracing pipeline
    Logger,
    /// The realtime broadcast layer
    Realtime,
    /// Listed but intentionally absent from this deployment
    Unconfigured,
}

impl ProbeKind {
    /// Whether the kind needs a `target`
    pub fn requires_target(&self) -> bool {
        matches!(self, ProbeKind::Tcp | ProbeKind::Http)
    }
}

/// One monitored dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Service name as reported in snapshots
    pub name: String,
    /// Probe kind
    pub kind: ProbeKind,
    /// `host:port` for tcp, URL for http
    #[serde(default)]
    pub target: Option<String>,
    /// Probe timeout; falls back to a per-name default
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Unhealthy alone makes the system unhealthy
    #[serde(default)]
    pub critical: bool,
    /// May be legitimately absent in a deployment
    #[serde(default)]
    pub optional: bool,
    /// Cache reuse window; falls back to the global one
    #[serde(default)]
    pub reuse_window_ms: Option<u64>,
}

impl ProbeConfig {
    /// Create a probe entry with defaults
    pub fn new(name: &str, kind: ProbeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target: None,
            timeout_ms: None,
            critical: false,
            optional: false,
            reuse_window_ms: None,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Effective timeout
    ///
    /// Cheap in-process probes get 2s, the database 5s, everything else 3s.
    pub fn timeout(&self) -> Duration {
        let ms = self.timeout_ms.unwrap_or(match (self.kind, self.name.as_str()) {
            (ProbeKind::Api | ProbeKind::Logger | ProbeKind::Realtime, _) => 2_000,
            (_, "logger" | "socket") => 2_000,
            (_, "database") => 5_000,
            _ => 3_000,
        });
        Duration::from_millis(ms)
    }
}

/// Dependencies monitored when no probe list is configured
pub fn default_probes() -> Vec<ProbeConfig> {
    vec![
        ProbeConfig::new("database", ProbeKind::Tcp)
            .with_target("127.0.0.1:5432")
            .critical(),
        ProbeConfig::new("cache", ProbeKind::Tcp)
            .with_target("127.0.0.1:6379")
            .critical(),
        ProbeConfig::new("queue", ProbeKind::Tcp).with_target("127.0.0.1:5672"),
        ProbeConfig::new("logger", ProbeKind::Logger),
        ProbeConfig::new("socket", ProbeKind::Realtime),
        ProbeConfig::new("api", ProbeKind::Api),
        ProbeConfig::new("communication", ProbeKind::Unconfigured).optional(),
    ]
}
