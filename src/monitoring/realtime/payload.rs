//! Realtime event payloads
//!
//! Field names are minified to keep frames small:
//!
//! | key   | meaning                    |
//! |-------|----------------------------|
//! | `o`   | overall status code        |
//! | `s`   | services / service status  |
//! | `r`   | response time (ms)         |
//! | `e`   | error or reason            |
//! | `t`   | timestamp (unix millis)    |
//! | `u`   | uptime (seconds)           |
//! | `sys` | system metrics             |
//!
//! Status codes are `h`, `d` and `u`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::monitoring::health::{
    AggregatedHealthStatus, HealthChange, HealthStatus, ServiceHealth, SystemMetrics,
};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One service in compact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactService {
    pub s: String,
    pub r: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub e: Option<String>,
    pub t: i64,
}

impl From<&ServiceHealth> for CompactService {
    fn from(health: &ServiceHealth) -> Self {
        let reason = match health.status {
            HealthStatus::Healthy => None,
            _ => health.error.clone().or_else(|| health.details.clone()),
        };
        Self {
            s: health.status.short_code().to_string(),
            r: health.response_time_ms,
            e: reason,
            t: health.last_checked_at.timestamp_millis(),
        }
    }
}

/// System metrics in compact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactSystem {
    /// CPU percent
    pub c: f64,
    /// Memory percent
    pub m: f64,
    /// Active connections
    pub a: u64,
    /// Requests per minute
    pub rr: f64,
    /// Error rate percent
    pub er: f64,
}

impl From<&SystemMetrics> for CompactSystem {
    fn from(system: &SystemMetrics) -> Self {
        Self {
            c: round1(system.cpu_percent),
            m: round1(system.memory_percent),
            a: system.active_connections,
            rr: round1(system.request_rate),
            er: round1(system.error_rate),
        }
    }
}

/// Full snapshot in compact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactSnapshot {
    pub o: String,
    pub s: BTreeMap<String, CompactService>,
    pub sys: CompactSystem,
    pub u: u64,
    pub t: i64,
}

impl From<&AggregatedHealthStatus> for CompactSnapshot {
    fn from(snapshot: &AggregatedHealthStatus) -> Self {
        Self {
            o: snapshot.overall().short_code().to_string(),
            s: snapshot
                .services
                .iter()
                .map(|(name, health)| (name.clone(), CompactService::from(health)))
                .collect(),
            sys: CompactSystem::from(&snapshot.system),
            u: snapshot.uptime_seconds,
            t: snapshot.timestamp.timestamp_millis(),
        }
    }
}

/// A change in compact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactChange {
    /// Previous status code, absent for new services
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p: Option<String>,
    /// Change type
    pub k: String,
    /// Severity
    pub v: String,
    /// Message
    pub m: String,
}

impl From<&HealthChange> for CompactChange {
    fn from(change: &HealthChange) -> Self {
        Self {
            p: change.previous_status.map(|s| s.short_code().to_string()),
            k: change.change_type.as_str().to_string(),
            v: change.severity.as_str().to_string(),
            m: change.message.clone(),
        }
    }
}

/// One service update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    /// Service name
    pub n: String,
    /// Current service state
    pub s: CompactService,
    /// The change that triggered this update
    pub c: CompactChange,
}

/// Liveness tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub o: String,
    pub u: u64,
    pub t: i64,
}

/// Reply to a client ping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub t: i64,
}

/// Event pushed to realtime subscribers
///
/// Serializes as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "health:status")]
    Status(CompactSnapshot),
    #[serde(rename = "health:service:update")]
    ServiceUpdate(ServiceUpdate),
    #[serde(rename = "health:heartbeat")]
    Heartbeat(Heartbeat),
    #[serde(rename = "pong")]
    Pong(Pong),
}

impl RealtimeEvent {
    /// Full snapshot event
    pub fn status(snapshot: &AggregatedHealthStatus) -> Self {
        RealtimeEvent::Status(CompactSnapshot::from(snapshot))
    }

    /// Single service event
    pub fn service_update(service: &str, health: &ServiceHealth, change: &HealthChange) -> Self {
        RealtimeEvent::ServiceUpdate(ServiceUpdate {
            n: service.to_string(),
            s: CompactService::from(health),
            c: CompactChange::from(change),
        })
    }

    /// Heartbeat event
    pub fn heartbeat(overall: HealthStatus, uptime_seconds: u64) -> Self {
        RealtimeEvent::Heartbeat(Heartbeat {
            o: overall.short_code().to_string(),
            u: uptime_seconds,
            t: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Ping reply
    pub fn pong() -> Self {
        RealtimeEvent::Pong(Pong {
            t: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::Status(_) => "health:status",
            RealtimeEvent::ServiceUpdate(_) => "health:service:update",
            RealtimeEvent::Heartbeat(_) => "health:heartbeat",
            RealtimeEvent::Pong(_) => "pong",
        }
    }

    /// Serialize to a wire frame
    pub fn to_frame(&self) -> crate::utils::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
