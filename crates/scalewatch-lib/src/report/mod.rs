//! Report generation from a finished timeline
//!
//! The builder aligns the per-pod CPU series (pods come and go as the
//! autoscaler works, so each tick reports a different key set), derives
//! pool utilization, computes summary statistics and classifies pool
//! health. The result renders to a single self-contained HTML document.

mod chart;
mod html;

#[cfg(test)]
mod tests;

use crate::health::PoolHealth;
use crate::models::{PoolSample, PoolSource, DEFAULT_POOL_CAPACITY};
use crate::timeline::TimelineStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Pod name -> CPU millicores per tick, every series the length of the timeline
pub type AlignedSeries = BTreeMap<String, Vec<u32>>;

/// Per-deployment summary figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub max_ready_replicas: u32,
    pub max_desired_replicas: u32,
    pub max_hpa_replicas: u32,
    pub peak_hpa_cpu_percent: u32,
    /// Most pods reporting CPU in a single tick
    pub peak_pod_count: usize,
    /// Distinct pod names seen over the whole run
    pub distinct_pods: usize,
}

/// Summary block of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub tick_count: usize,
    pub interval_secs: f64,
    pub duration_secs: f64,
    pub max_utilization_percent: f64,
    pub avg_utilization_percent: f64,
    pub max_waiting: u32,
    /// Ticks whose waiting queue was non-empty
    pub exhaustion_events: usize,
    /// Ticks whose pool numbers are defaults because logs were unreadable
    pub pool_unavailable_ticks: usize,
    pub max_ready_nodes: u32,
    pub deployments: BTreeMap<String, DeploymentSummary>,
    pub health: PoolHealth,
}

/// A built report, borrowing the timeline it was built from
#[derive(Debug)]
pub struct Report<'a> {
    pub title: String,
    pub timeline: &'a TimelineStore,
    pub summary: ReportSummary,
    /// Deployment -> aligned per-pod CPU series
    pub aligned: BTreeMap<String, AlignedSeries>,
    /// Pool utilization percent per tick
    pub utilization: Vec<f64>,
}

impl Report<'_> {
    /// Summary block as pretty JSON
    pub fn summary_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.summary).context("Failed to serialize report summary")
    }

    /// Render the self-contained HTML document
    pub fn to_html(&self) -> Result<String> {
        html::render(self)
    }

    /// Render and write the HTML document
    pub fn write_html(&self, path: &Path) -> Result<()> {
        let content = self.to_html()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

/// Builds reports from completed timelines
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new("Autoscaling load test")
    }
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Build a report. Must only be called once sampling has stopped.
    pub fn build<'a>(&self, timeline: &'a TimelineStore) -> Report<'a> {
        let utilization: Vec<f64> = timeline.pool_samples().map(pool_utilization).collect();
        let aligned: BTreeMap<String, AlignedSeries> = deployment_names(timeline)
            .into_iter()
            .map(|name| {
                let series = align_pod_cpu(timeline, &name);
                (name, series)
            })
            .collect();

        let summary = summarize(timeline, &utilization, &aligned);

        Report {
            title: self.title.clone(),
            timeline,
            summary,
            aligned,
            utilization,
        }
    }
}

/// Pool utilization of one tick in percent; a zero capacity is read as the default capacity
pub fn pool_utilization(sample: &PoolSample) -> f64 {
    let capacity = match sample.stats.capacity {
        0 => DEFAULT_POOL_CAPACITY,
        c => c,
    };
    sample.stats.active as f64 * 100.0 / capacity as f64
}

/// Every deployment name appearing in any tick
pub fn deployment_names(timeline: &TimelineStore) -> BTreeSet<String> {
    timeline
        .snapshots()
        .flat_map(|s| s.deployments.keys().cloned())
        .collect()
}

/// Align a deployment's per-pod CPU into equal-length series
///
/// The key set is the union of pod names over all ticks; a pod missing
/// from a tick contributes 0 for that tick.
pub fn align_pod_cpu(timeline: &TimelineStore, deployment: &str) -> AlignedSeries {
    let pods: BTreeSet<&String> = timeline
        .snapshots()
        .filter_map(|s| s.deployments.get(deployment))
        .flat_map(|d| d.pod_cpu_millicores.keys())
        .collect();

    pods.into_iter()
        .map(|pod| {
            let series = timeline
                .snapshots()
                .map(|s| {
                    s.deployments
                        .get(deployment)
                        .and_then(|d| d.pod_cpu_millicores.get(pod))
                        .copied()
                        .unwrap_or(0)
                })
                .collect();
            (pod.clone(), series)
        })
        .collect()
}

fn summarize(
    timeline: &TimelineStore,
    utilization: &[f64],
    aligned: &BTreeMap<String, AlignedSeries>,
) -> ReportSummary {
    let max_utilization_percent = utilization.iter().copied().fold(0.0, f64::max);
    let avg_utilization_percent = if utilization.is_empty() {
        0.0
    } else {
        utilization.iter().sum::<f64>() / utilization.len() as f64
    };

    let max_waiting = timeline
        .pool_samples()
        .map(|p| p.stats.waiting)
        .max()
        .unwrap_or(0);
    let exhaustion_events = timeline
        .pool_samples()
        .filter(|p| p.stats.waiting > 0)
        .count();
    let pool_unavailable_ticks = timeline
        .pool_samples()
        .filter(|p| p.stats.source == PoolSource::Unavailable)
        .count();
    let max_ready_nodes = timeline
        .snapshots()
        .map(|s| s.nodes.ready)
        .max()
        .unwrap_or(0);

    let deployments = aligned
        .iter()
        .map(|(name, series)| {
            let mut summary = DeploymentSummary {
                distinct_pods: series.len(),
                ..Default::default()
            };
            for status in timeline.snapshots().filter_map(|s| s.deployments.get(name)) {
                summary.max_ready_replicas = summary.max_ready_replicas.max(status.ready_replicas);
                summary.max_desired_replicas =
                    summary.max_desired_replicas.max(status.desired_replicas);
                summary.max_hpa_replicas = summary.max_hpa_replicas.max(status.hpa_replicas);
                summary.peak_hpa_cpu_percent =
                    summary.peak_hpa_cpu_percent.max(status.hpa_cpu_percent);
                summary.peak_pod_count = summary.peak_pod_count.max(status.pod_cpu_millicores.len());
            }
            (name.clone(), summary)
        })
        .collect();

    ReportSummary {
        tick_count: timeline.len(),
        interval_secs: timeline.interval_secs(),
        duration_secs: timeline.duration_secs(),
        max_utilization_percent,
        avg_utilization_percent,
        max_waiting,
        exhaustion_events,
        pool_unavailable_ticks,
        max_ready_nodes,
        deployments,
        health: PoolHealth::classify(max_waiting, max_utilization_percent),
    }
}
