//! Health system integration tests
//!
//! Aggregation, deduplication, the background monitor and realtime fan-out
//! exercised together through `HealthSystem`.

#[cfg(test)]
mod tests {
    use crate::common::{ScriptedProbe, health_system, no_reuse, test_config};
    use healthcast::monitoring::HealthSystem;
    use healthcast::monitoring::health::{HealthStatus, ProbeRegistry, ProbeSettings};
    use healthcast::monitoring::realtime::{RealtimeEvent, Subscription};
    use std::sync::Arc;
    use std::time::Duration;

    async fn next_event(subscription: &mut Subscription) -> RealtimeEvent {
        tokio::time::timeout(Duration::from_secs(2), subscription.recv())
            .await
            .expect("no event within 2s")
            .expect("room closed")
    }

    fn system_with(database: &Arc<ScriptedProbe>, queue: &Arc<ScriptedProbe>) -> HealthSystem {
        let registry = ProbeRegistry::new()
            .with("database", database.clone(), no_reuse().critical())
            .with("queue", queue.clone(), no_reuse());
        health_system(&test_config(), registry)
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_cycle() {
        let database = ScriptedProbe::slow(HealthStatus::Healthy, Duration::from_millis(100));
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let aggregator = system.aggregator().clone();
                tokio::spawn(async move { aggregator.current_status().await })
            })
            .collect();
        for handle in handles {
            let snapshot = handle.await.unwrap();
            assert_eq!(snapshot.overall(), HealthStatus::Healthy);
        }

        assert_eq!(database.calls(), 1);
        assert_eq!(system.aggregator().on_demand_runs(), 1);
    }

    #[tokio::test]
    async fn test_slow_probe_is_bounded_by_its_timeout() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::slow(HealthStatus::Healthy, Duration::from_secs(5));
        let registry = ProbeRegistry::new()
            .with("database", database.clone(), no_reuse().critical())
            .with(
                "queue",
                queue.clone(),
                ProbeSettings::default()
                    .with_timeout(Duration::from_millis(50))
                    .with_reuse_window(Duration::ZERO),
            );
        let system = health_system(&test_config(), registry);

        let started = std::time::Instant::now();
        let snapshot = system.aggregator().refresh().await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(snapshot.services["queue"].error.as_deref(), Some("timeout"));
        assert_eq!(snapshot.overall(), HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_status_change_reaches_subscribers() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);
        let monitor = system.monitor();

        let mut subscription = system.broadcaster().subscribe(None);
        assert!(matches!(
            next_event(&mut subscription).await,
            RealtimeEvent::Status(_)
        ));

        let report = monitor.run_once().await.unwrap();
        assert!(report.changes.is_empty());
        assert!(report.published_snapshot);
        match next_event(&mut subscription).await {
            RealtimeEvent::Status(snapshot) => assert_eq!(snapshot.o, "h"),
            other => panic!("expected status, got {:?}", other),
        }

        database.set(HealthStatus::Unhealthy);
        let report = monitor.run_once().await.unwrap();
        assert_eq!(report.snapshot.overall(), HealthStatus::Unhealthy);
        assert!(report.changes.iter().any(|c| c.service == "database"));

        match next_event(&mut subscription).await {
            RealtimeEvent::Status(snapshot) => {
                assert_eq!(snapshot.o, "u");
                assert_eq!(snapshot.s["database"].s, "u");
            }
            other => panic!("expected status, got {:?}", other),
        }
        match next_event(&mut subscription).await {
            RealtimeEvent::ServiceUpdate(update) => {
                assert_eq!(update.n, "database");
                assert_eq!(update.s.s, "u");
            }
            other => panic!("expected service update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_rooms_do_not_receive_monitor_events() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);

        let mut ops = system.broadcaster().subscribe(Some("ops"));
        assert!(ops.take_initial().is_some());

        system.monitor().run_once().await.unwrap();
        let received = tokio::time::timeout(Duration::from_millis(100), ops.recv()).await;
        assert!(received.is_err());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_cached_snapshot() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Degraded);
        let system = system_with(&database, &queue);

        system.monitor().run_once().await.unwrap();

        let mut subscription = system.broadcaster().subscribe(None);
        match subscription.take_initial() {
            Some(RealtimeEvent::Status(snapshot)) => {
                assert_eq!(snapshot.o, "d");
                assert_eq!(snapshot.s.len(), 2);
            }
            other => panic!("expected initial status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_background_monitor_lifecycle() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);

        system.start();
        assert!(system.monitor().is_running());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(system.monitor().cycles() >= 2);
        assert!(!system.cache().is_empty());

        system.stop().await;
        assert!(!system.monitor().is_running());
        assert!(system.cache().is_empty());

        let cycles = system.monitor().cycles();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(system.monitor().cycles(), cycles);
    }

    #[tokio::test]
    async fn test_fast_loop_publishes_critical_flip() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);

        system.monitor().run_once().await.unwrap();
        database.set(HealthStatus::Unhealthy);

        let change = system.monitor().check_critical().await;
        let change = change.expect("database flip should be reported");
        assert_eq!(change.service, "database");
        assert_eq!(change.previous_status, Some(HealthStatus::Healthy));
        assert_eq!(change.current_status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_performance_regression_is_detected() {
        let database = ScriptedProbe::new(HealthStatus::Healthy);
        let queue = ScriptedProbe::new(HealthStatus::Healthy);
        let system = system_with(&database, &queue);

        queue.set_response_time(20);
        system.monitor().run_once().await.unwrap();
        queue.set_response_time(40);
        let report = system.monitor().run_once().await.unwrap();

        assert!(
            report
                .changes
                .iter()
                .any(|c| c.service == "queue" && c.current_status == HealthStatus::Healthy)
        );
        assert_eq!(report.snapshot.overall(), HealthStatus::Healthy);
    }
}
