//! Environment overrides
//!
//! Variables use the `HEALTHCAST_` prefix. Probes are addressed as
//! `HEALTHCAST_PROBE_<NAME>_<FIELD>` where field is one of `KIND`,
//! `TARGET`, `TIMEOUT_MS`, `CRITICAL` or `OPTIONAL`.

use super::Config;
use super::models::*;
use crate::utils::error::{HealthcastError, Result};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

const PREFIX: &str = "HEALTHCAST_";
const PROBE_PREFIX: &str = "HEALTHCAST_PROBE_";

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| HealthcastError::Config(format!("Invalid value for {}: {}", key, e)))
}

fn parse_kind(key: &str, value: &str) -> Result<ProbeKind> {
    serde_yaml::from_str(&value.to_lowercase())
        .map_err(|e| HealthcastError::Config(format!("Invalid value for {}: {}", key, e)))
}

impl Config {
    /// Apply environment overrides from the given variables
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut probe_fields: HashMap<String, HashMap<String, (String, String)>> = HashMap::new();

        for (key, value) in vars {
            if let Some(rest) = key.strip_prefix(PROBE_PREFIX) {
                // Names may contain underscores, fields never start the name
                if let Some((name, field)) = split_probe_key(rest) {
                    probe_fields
                        .entry(name)
                        .or_default()
                        .insert(field, (key.clone(), value));
                }
                continue;
            }

            let Some(setting) = key.strip_prefix(PREFIX) else {
                continue;
            };

            let app = &mut self.app;
            match setting {
                "HOST" => app.server.host = value,
                "PORT" => app.server.port = parse(&key, &value)?,
                "WORKERS" => app.server.workers = Some(parse(&key, &value)?),
                "CHECK_INTERVAL_MS" => {
                    app.monitoring.health.check_interval_ms = parse(&key, &value)?
                }
                "CRITICAL_CHECK_INTERVAL_MS" => {
                    app.monitoring.health.critical_check_interval_ms = parse(&key, &value)?
                }
                "REUSE_WINDOW_MS" => app.monitoring.health.reuse_window_ms = parse(&key, &value)?,
                "SNAPSHOT_FRESH_MS" => {
                    app.monitoring.health.snapshot_fresh_ms = parse(&key, &value)?
                }
                "HARD_CEILING_MS" => app.monitoring.health.hard_ceiling_ms = parse(&key, &value)?,
                "MIN_REQUEST_INTERVAL_MS" => {
                    app.monitoring.health.min_request_interval_ms = parse(&key, &value)?
                }
                "REVERIFY_TIMEOUT_MS" => {
                    app.monitoring.health.reverify_timeout_ms = parse(&key, &value)?
                }
                "HEARTBEAT_INTERVAL_MS" => {
                    app.monitoring.realtime.heartbeat_interval_ms = parse(&key, &value)?
                }
                "REALTIME_ENABLED" => app.monitoring.realtime.enabled = parse(&key, &value)?,
                "METRICS_ENABLED" => app.monitoring.metrics.enabled = parse(&key, &value)?,
                "LOG_LEVEL" => app.logging.level = value,
                "LOG_JSON" => app.logging.json = parse(&key, &value)?,
                _ => debug!("Ignoring unknown setting {}", key),
            }
        }

        for (name, fields) in probe_fields {
            self.apply_probe_override(&name, fields)?;
        }

        Ok(())
    }

    fn apply_probe_override(
        &mut self,
        name: &str,
        fields: HashMap<String, (String, String)>,
    ) -> Result<()> {
        let index = match self.app.probes.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                let (key, kind) = fields.get("kind").ok_or_else(|| {
                    HealthcastError::Config(format!("Probe {} missing kind", name))
                })?;
                let kind = parse_kind(key, kind)?;
                self.app.probes.push(ProbeConfig::new(name, kind));
                self.app.probes.len() - 1
            }
        };

        let probe = &mut self.app.probes[index];
        for (field, (key, value)) in fields {
            match field.as_str() {
                "kind" => probe.kind = parse_kind(&key, &value)?,
                "target" => probe.target = Some(value),
                "timeout_ms" => probe.timeout_ms = Some(parse(&key, &value)?),
                "critical" => probe.critical = parse(&key, &value)?,
                "optional" => probe.optional = parse(&key, &value)?,
                _ => debug!("Ignoring unknown probe setting {}", key),
            }
        }

        // A target supplied for a placeholder turns it into a real probe
        if probe.kind == ProbeKind::Unconfigured && probe.target.is_some() {
            probe.kind = if probe.target.as_deref().is_some_and(|t| t.starts_with("http")) {
                ProbeKind::Http
            } else {
                ProbeKind::Tcp
            };
        }

        debug!("Applied environment overrides for probe {}", name);
        Ok(())
    }
}

/// Split `DATABASE_TIMEOUT_MS` into (`database`, `timeout_ms`)
fn split_probe_key(rest: &str) -> Option<(String, String)> {
    const FIELDS: [&str; 5] = ["_TIMEOUT_MS", "_TARGET", "_KIND", "_CRITICAL", "_OPTIONAL"];
    FIELDS.iter().find_map(|field| {
        rest.strip_suffix(field).filter(|name| !name.is_empty()).map(|name| {
            (
                name.to_lowercase(),
                field.trim_start_matches('_').to_lowercase(),
            )
        })
    })
}
