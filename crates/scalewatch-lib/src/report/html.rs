//! Self-contained HTML rendering
//!
//! Everything the page needs is inline: stylesheet, SVG charts and the
//! raw data as JSON blocks, so the file can be mailed or archived as is.

use super::chart::{color, ChartView, LineChart, Series};
use super::Report;
use crate::models::DeploymentStatus;
use crate::timeline::TimelineStore;
use anyhow::{Context, Result};
use askama::Template;
use serde::Serialize;

struct SummaryRow {
    label: &'static str,
    value: String,
}

struct DeploymentRow {
    name: String,
    max_ready: u32,
    max_desired: u32,
    max_hpa_replicas: u32,
    peak_hpa_cpu: u32,
    peak_pods: usize,
    distinct_pods: usize,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    title: String,
    window: String,
    tick_count: usize,
    interval_secs: f64,
    health: String,
    health_color: &'static str,
    summary_rows: Vec<SummaryRow>,
    deployment_rows: Vec<DeploymentRow>,
    charts: Vec<ChartView>,
    summary_json: String,
    aligned_json: String,
    timeline_json: String,
}

/// Serialize for embedding inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize report data")?;
    Ok(json.replace("</", "<\\/"))
}

fn run_window(timeline: &TimelineStore) -> String {
    match (timeline.ticks().first(), timeline.ticks().last()) {
        (Some(first), Some(last)) => format!(
            "{} to {} UTC",
            first.snapshot.captured_at.format("%Y-%m-%d %H:%M:%S"),
            last.snapshot.captured_at.format("%H:%M:%S")
        ),
        _ => "no ticks recorded".to_string(),
    }
}

fn charts(report: &Report<'_>) -> Vec<ChartView> {
    let timeline = report.timeline;
    let x: Vec<f64> = timeline.snapshots().map(|s| s.elapsed_seconds).collect();
    let deployment_series = |name: &str, f: fn(&DeploymentStatus) -> u32| -> Vec<f64> {
        timeline
            .snapshots()
            .map(|s| s.deployments.get(name).map_or(0, f) as f64)
            .collect()
    };

    let mut charts = Vec::new();

    let mut scaling = Vec::new();
    for (i, name) in report.aligned.keys().enumerate() {
        scaling.push(Series::new(
            format!("{name} ready"),
            deployment_series(name, |d| d.ready_replicas),
            color(i),
        ));
        scaling.push(
            Series::new(
                format!("{name} desired"),
                deployment_series(name, |d| d.desired_replicas),
                color(i),
            )
            .dashed(),
        );
    }
    scaling.push(Series::new(
        "ready nodes",
        timeline.snapshots().map(|s| s.nodes.ready as f64).collect(),
        "#424242",
    ));
    charts.push(
        LineChart {
            heading: "Scaling".to_string(),
            y_label: "count",
            x: &x,
            series: scaling,
        }
        .layout(),
    );

    let hpa_cpu = report
        .aligned
        .keys()
        .enumerate()
        .map(|(i, name)| {
            Series::new(
                format!("{name} HPA CPU"),
                deployment_series(name, |d| d.hpa_cpu_percent),
                color(i),
            )
        })
        .collect();
    charts.push(
        LineChart {
            heading: "Autoscaler CPU".to_string(),
            y_label: "% of request",
            x: &x,
            series: hpa_cpu,
        }
        .layout(),
    );

    for (name, pods) in &report.aligned {
        let series = pods
            .iter()
            .enumerate()
            .map(|(i, (pod, values))| {
                Series::new(pod.clone(), values.iter().map(|v| *v as f64).collect(), color(i))
            })
            .collect();
        charts.push(
            LineChart {
                heading: format!("Pod CPU: {name}"),
                y_label: "millicores",
                x: &x,
                series,
            }
            .layout(),
        );
    }

    let pool = vec![
        Series::new("utilization %", report.utilization.clone(), color(0)),
        Series::new(
            "waiting",
            timeline.pool_samples().map(|p| p.stats.waiting as f64).collect(),
            color(2),
        ),
    ];
    charts.push(
        LineChart {
            heading: "Connection pool".to_string(),
            y_label: "percent / requests",
            x: &x,
            series: pool,
        }
        .layout(),
    );

    charts
}

pub fn render(report: &Report<'_>) -> Result<String> {
    let summary = &report.summary;

    let summary_rows = vec![
        SummaryRow { label: "Test duration", value: format!("{:.0}s", summary.duration_secs) },
        SummaryRow { label: "Max pool utilization", value: format!("{:.1}%", summary.max_utilization_percent) },
        SummaryRow { label: "Avg pool utilization", value: format!("{:.1}%", summary.avg_utilization_percent) },
        SummaryRow { label: "Max waiting requests", value: summary.max_waiting.to_string() },
        SummaryRow { label: "Exhaustion events", value: summary.exhaustion_events.to_string() },
        SummaryRow { label: "Ticks without pool logs", value: summary.pool_unavailable_ticks.to_string() },
        SummaryRow { label: "Max ready nodes", value: summary.max_ready_nodes.to_string() },
        SummaryRow { label: "Health", value: summary.health.to_string() },
    ];

    let deployment_rows = summary
        .deployments
        .iter()
        .map(|(name, d)| DeploymentRow {
            name: name.clone(),
            max_ready: d.max_ready_replicas,
            max_desired: d.max_desired_replicas,
            max_hpa_replicas: d.max_hpa_replicas,
            peak_hpa_cpu: d.peak_hpa_cpu_percent,
            peak_pods: d.peak_pod_count,
            distinct_pods: d.distinct_pods,
        })
        .collect();

    let page = ReportTemplate {
        title: report.title.clone(),
        window: run_window(report.timeline),
        tick_count: summary.tick_count,
        interval_secs: summary.interval_secs,
        health: summary.health.to_string(),
        health_color: summary.health.color(),
        summary_rows,
        deployment_rows,
        charts: charts(report),
        summary_json: script_json(summary)?,
        aligned_json: script_json(&report.aligned)?,
        timeline_json: script_json(report.timeline)?,
    };

    page.render().context("Failed to render report template")
}
