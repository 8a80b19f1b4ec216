//! Configuration loading integration tests

#[cfg(test)]
mod tests {
    use crate::{assert_err, assert_ok};
    use healthcast::config::{Config, ProbeKind};
    use healthcast::server::builder::load_config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_yaml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_from_file_fills_defaults() {
        let file = write_yaml(
            r#"
server:
  port: 9200
probes:
  - name: database
    kind: tcp
    target: "db.internal:5432"
    critical: true
  - name: search
    kind: http
    target: "http://search.internal/health"
    timeout_ms: 1500
"#,
        );

        let config = assert_ok!(Config::from_file(file.path()).await);
        assert_eq!(config.server().port, 9200);
        assert_eq!(config.server().host, "0.0.0.0");
        assert_eq!(config.probes().len(), 2);
        assert_eq!(config.probes()[1].kind, ProbeKind::Http);
        assert_eq!(config.probes()[1].timeout_ms, Some(1500));
        assert_eq!(config.health().hard_ceiling_ms, 30_000);
        assert_eq!(config.monitoring().realtime.default_room, "health-updates");
    }

    #[tokio::test]
    async fn test_from_file_without_probes_uses_default_set() {
        let file = write_yaml("logging:\n  level: debug\n");

        let config = assert_ok!(Config::from_file(file.path()).await);
        assert_eq!(config.logging().level, "debug");
        let names: Vec<&str> = config.probes().iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"database"));
        assert!(names.contains(&"communication"));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_a_config_error() {
        let file = write_yaml("server: [not, a, map");
        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(err.to_string().contains("Configuration error"));
    }

    #[tokio::test]
    async fn test_probe_without_target_is_rejected() {
        let file = write_yaml(
            r#"
probes:
  - name: database
    kind: tcp
"#,
        );
        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(err.to_string().contains("requires a target"));
    }

    #[tokio::test]
    async fn test_reuse_window_above_ceiling_is_rejected() {
        let file = write_yaml(
            r#"
monitoring:
  health:
    reuse_window_ms: 60000
    hard_ceiling_ms: 30000
"#,
        );
        assert_err!(Config::from_file(file.path()).await);
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = assert_ok!(load_config(dir.path().join("absent.yaml")).await);
        assert_eq!(config.probes().len(), Config::default().probes().len());
    }

    #[test]
    fn test_env_overrides_turn_placeholder_into_probe() {
        let mut config = Config::default();
        let vars = vec![
            (
                "HEALTHCAST_PROBE_COMMUNICATION_TARGET".to_string(),
                "http://mailer.internal/health".to_string(),
            ),
            (
                "HEALTHCAST_PROBE_METRICS_STORE_KIND".to_string(),
                "tcp".to_string(),
            ),
            (
                "HEALTHCAST_PROBE_METRICS_STORE_TARGET".to_string(),
                "127.0.0.1:9000".to_string(),
            ),
        ];
        assert_ok!(config.apply_env_overrides(vars));

        let communication = config
            .probes()
            .iter()
            .find(|p| p.name == "communication")
            .unwrap();
        assert_eq!(communication.kind, ProbeKind::Http);

        let store = config
            .probes()
            .iter()
            .find(|p| p.name == "metrics_store")
            .unwrap();
        assert_eq!(store.kind, ProbeKind::Tcp);
        assert_eq!(store.target.as_deref(), Some("127.0.0.1:9000"));
        assert_ok!(config.validate());
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::default();
        let err = assert_err!(
            config.apply_env_overrides(vec![("HEALTHCAST_PORT".to_string(), "nope".to_string())])
        );
        assert!(err.to_string().contains("HEALTHCAST_PORT"));
    }
}
