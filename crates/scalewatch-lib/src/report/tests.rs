//! Tests for report building

#[cfg(test)]
mod builder_tests {
    use crate::health::PoolHealth;
    use crate::models::{
        DeploymentStatus, NodeStatus, PoolSample, PoolSource, PoolStats, Snapshot, TickRecord,
    };
    use crate::report::{align_pod_cpu, pool_utilization, ReportBuilder};
    use crate::timeline::TimelineStore;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::time::Duration;

    const INTERVAL: f64 = 2.0;

    fn tick(index: usize, pods: &[(&str, u32)], ready: u32, active: u32, waiting: u32) -> TickRecord {
        let elapsed_seconds = index as f64 * INTERVAL;
        let mut deployments = BTreeMap::new();
        deployments.insert(
            "web".to_string(),
            DeploymentStatus {
                desired_replicas: ready + 1,
                ready_replicas: ready,
                hpa_replicas: ready,
                hpa_cpu_percent: 40 + index as u32 * 10,
                pod_cpu_millicores: pods.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            },
        );
        TickRecord {
            snapshot: Snapshot {
                elapsed_seconds,
                captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, index as u32 * 2).unwrap(),
                nodes: NodeStatus {
                    total: 3,
                    ready: 2 + (index as u32 % 2),
                },
                deployments,
            },
            pool: PoolSample {
                elapsed_seconds,
                stats: PoolStats {
                    capacity: 10,
                    active,
                    idle: 10 - active,
                    waiting,
                    source: PoolSource::Observed,
                },
            },
        }
    }

    fn timeline(records: Vec<TickRecord>) -> TimelineStore {
        let mut store = TimelineStore::new(Duration::from_secs_f64(INTERVAL));
        for record in records {
            store.append(record).unwrap();
        }
        store
    }

    fn churn_timeline() -> TimelineStore {
        timeline(vec![
            tick(0, &[("A", 120), ("B", 300)], 2, 3, 0),
            tick(1, &[("B", 310), ("C", 90)], 2, 9, 0),
            tick(2, &[("C", 450)], 1, 6, 0),
        ])
    }

    #[test]
    fn test_aligned_series_fill_missing_pods_with_zero() {
        let store = churn_timeline();
        let aligned = align_pod_cpu(&store, "web");

        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned["A"], vec![120, 0, 0]);
        assert_eq!(aligned["B"], vec![300, 310, 0]);
        assert_eq!(aligned["C"], vec![0, 90, 450]);
        assert!(aligned.values().all(|s| s.len() == store.len()));
    }

    #[test]
    fn test_aligned_series_unknown_deployment_is_empty() {
        assert!(align_pod_cpu(&churn_timeline(), "api").is_empty());
    }

    #[test]
    fn test_utilization_with_zero_capacity_uses_default() {
        let mut sample = tick(0, &[], 1, 5, 0).pool;
        assert_eq!(pool_utilization(&sample), 50.0);

        sample.stats.capacity = 0;
        assert_eq!(pool_utilization(&sample), 50.0);

        sample.stats.capacity = 20;
        assert_eq!(pool_utilization(&sample), 25.0);
    }

    #[test]
    fn test_summary_statistics() {
        let store = churn_timeline();
        let report = ReportBuilder::default().build(&store);
        let summary = &report.summary;

        assert_eq!(summary.tick_count, 3);
        assert_eq!(summary.duration_secs, 6.0);
        assert_eq!(summary.max_utilization_percent, 90.0);
        assert_eq!(summary.avg_utilization_percent, 60.0);
        assert_eq!(summary.max_waiting, 0);
        assert_eq!(summary.exhaustion_events, 0);
        assert_eq!(summary.max_ready_nodes, 3);
        assert_eq!(summary.health, PoolHealth::Healthy);

        let web = &summary.deployments["web"];
        assert_eq!(web.max_ready_replicas, 2);
        assert_eq!(web.max_desired_replicas, 3);
        assert_eq!(web.peak_hpa_cpu_percent, 60);
        assert_eq!(web.peak_pod_count, 2);
        assert_eq!(web.distinct_pods, 3);
    }

    #[test]
    fn test_high_utilization_without_waiters_is_saturated() {
        let store = timeline(vec![
            tick(0, &[("A", 100)], 1, 4, 0),
            tick(1, &[("A", 100)], 1, 10, 0),
        ]);
        let report = ReportBuilder::default().build(&store);
        assert_eq!(report.summary.max_utilization_percent, 100.0);
        assert_eq!(report.summary.health, PoolHealth::Saturated);
    }

    #[test]
    fn test_any_waiters_mean_exhausted() {
        let store = timeline(vec![
            tick(0, &[("A", 100)], 1, 2, 0),
            tick(1, &[("A", 100)], 1, 3, 4),
            tick(2, &[("A", 100)], 1, 2, 0),
            tick(3, &[("A", 100)], 1, 3, 1),
        ]);
        let summary = ReportBuilder::default().build(&store).summary;

        assert_eq!(summary.max_waiting, 4);
        assert_eq!(summary.exhaustion_events, 2);
        assert_eq!(summary.health, PoolHealth::Exhausted);
    }

    #[test]
    fn test_unavailable_pool_ticks_counted() {
        let mut record = tick(0, &[], 1, 0, 0);
        record.pool.stats = PoolStats::healthy_default(PoolSource::Unavailable);
        let store = timeline(vec![record, tick(1, &[], 1, 0, 0)]);

        let summary = ReportBuilder::default().build(&store).summary;
        assert_eq!(summary.pool_unavailable_ticks, 1);
        assert_eq!(summary.health, PoolHealth::Healthy);
    }

    #[test]
    fn test_building_twice_is_identical() {
        let store = churn_timeline();
        let builder = ReportBuilder::new("Idempotence");

        let first = builder.build(&store).summary_json().unwrap();
        let second = builder.build(&store).summary_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_timeline() {
        let store = TimelineStore::new(Duration::from_secs(5));
        let report = ReportBuilder::default().build(&store);

        assert_eq!(report.summary.tick_count, 0);
        assert_eq!(report.summary.duration_secs, 0.0);
        assert_eq!(report.summary.avg_utilization_percent, 0.0);
        assert_eq!(report.summary.health, PoolHealth::Healthy);
        assert!(report.aligned.is_empty());
        assert!(report.to_html().unwrap().contains("no ticks recorded"));
    }

    #[test]
    fn test_html_is_self_contained() {
        let store = churn_timeline();
        let html = ReportBuilder::new("Checkout <load> test")
            .build(&store)
            .to_html()
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Checkout &"));
        assert!(!html.contains("Checkout <load> test"));
        assert!(html.contains(r#"id="timeline-data""#));
        assert!(html.contains(r#"id="aligned-data""#));
        assert!(html.contains(r#""C":[0,90,450]"#));
        assert!(html.contains("<svg"));
        assert!(html.contains("Pod CPU: web"));
        assert!(!html.contains("<script src"));
        assert!(!html.contains("<link"));
    }

    #[test]
    fn test_html_escapes_pod_names_in_charts() {
        let store = timeline(vec![tick(0, &[("web-<x>", 100)], 1, 0, 0)]);
        let html = ReportBuilder::default().build(&store).to_html().unwrap();

        assert!(html.contains("<title>web-&"));
        assert!(!html.contains("<title>web-<x>"));
        assert!(!html.contains("</i>web-<x>"));
    }

    #[test]
    fn test_write_html() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("report.html");

        let store = churn_timeline();
        ReportBuilder::default().build(&store).write_html(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Healthy"));
    }
}
