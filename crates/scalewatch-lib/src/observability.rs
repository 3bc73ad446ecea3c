//! Observability infrastructure for the sampler
//!
//! Provides:
//! - Prometheus metrics (tick latency, tick count, collector fallbacks, shutdown timeouts)
//! - Structured logging of run-level events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge_vec,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGaugeVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for tick latency (in seconds). A tick is a handful of
/// sequential kubectl calls, so it lands between tens of ms and seconds.
const TICK_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];

/// Collector names used as the `collector` label
pub mod collectors {
    pub const AUTOSCALER: &str = "autoscaler";
    pub const DEPLOYMENT: &str = "deployment";
    pub const POD_CPU: &str = "pod_cpu";
    pub const NODES: &str = "nodes";
    pub const POOL_LOGS: &str = "pool_logs";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SamplerMetricsInner> = OnceLock::new();

struct SamplerMetricsInner {
    tick_latency_seconds: Histogram,
    ticks: IntCounter,
    collector_fallbacks: IntCounterVec,
    exhaustion_ticks: IntCounter,
    shutdown_timeouts: IntCounter,
    pods_observed: IntGaugeVec,
}

impl SamplerMetricsInner {
    fn new() -> Self {
        Self {
            tick_latency_seconds: register_histogram!(
                "scalewatch_tick_latency_seconds",
                "Time spent collecting one sampler tick",
                TICK_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register tick_latency_seconds"),

            ticks: register_int_counter!(
                "scalewatch_ticks_total",
                "Total number of completed sampler ticks"
            )
            .expect("Failed to register ticks_total"),

            collector_fallbacks: register_int_counter_vec!(
                "scalewatch_collector_fallbacks_total",
                "Collector calls that fell back to default values",
                &["collector"]
            )
            .expect("Failed to register collector_fallbacks_total"),

            exhaustion_ticks: register_int_counter!(
                "scalewatch_exhaustion_ticks_total",
                "Ticks whose pool waiting queue was non-empty"
            )
            .expect("Failed to register exhaustion_ticks_total"),

            shutdown_timeouts: register_int_counter!(
                "scalewatch_shutdown_timeouts_total",
                "Sampler stops that exceeded the join timeout"
            )
            .expect("Failed to register shutdown_timeouts_total"),

            pods_observed: register_int_gauge_vec!(
                "scalewatch_pods_observed",
                "Pods reporting CPU usage in the latest tick",
                &["deployment"]
            )
            .expect("Failed to register pods_observed"),
        }
    }
}

/// Sampler metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct SamplerMetrics {
    _private: (),
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SamplerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SamplerMetricsInner {
        GLOBAL_METRICS.get_or_init(SamplerMetricsInner::new)
    }

    pub fn observe_tick_latency(&self, duration_secs: f64) {
        self.inner().tick_latency_seconds.observe(duration_secs);
        self.inner().ticks.inc();
    }

    pub fn inc_collector_fallback(&self, collector: &str) {
        self.inner()
            .collector_fallbacks
            .with_label_values(&[collector])
            .inc();
    }

    pub fn inc_exhaustion_ticks(&self) {
        self.inner().exhaustion_ticks.inc();
    }

    pub fn inc_shutdown_timeouts(&self) {
        self.inner().shutdown_timeouts.inc();
    }

    pub fn set_pods_observed(&self, deployment: &str, count: i64) {
        self.inner()
            .pods_observed
            .with_label_values(&[deployment])
            .set(count);
    }

    pub fn ticks_total(&self) -> u64 {
        self.inner().ticks.get()
    }

    pub fn collector_fallbacks(&self, collector: &str) -> u64 {
        self.inner()
            .collector_fallbacks
            .with_label_values(&[collector])
            .get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render_text(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode sampler metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for run-level events
#[derive(Clone)]
pub struct RunLogger {
    run_id: String,
}

impl RunLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log sampler start
    pub fn log_run_start(&self, interval_secs: f64, deployments: &[String]) {
        info!(
            event = "run_started",
            run_id = %self.run_id,
            interval_secs = interval_secs,
            deployments = ?deployments,
            "Sampling started"
        );
    }

    /// Log load generator completion
    pub fn log_load_finished(&self, success: bool, detail: &str) {
        if success {
            info!(
                event = "load_finished",
                run_id = %self.run_id,
                detail = %detail,
                "Load generator finished"
            );
        } else {
            warn!(
                event = "load_finished",
                run_id = %self.run_id,
                detail = %detail,
                "Load generator did not finish cleanly"
            );
        }
    }

    /// Log sampler shutdown
    pub fn log_shutdown(&self, ticks: usize, timed_out: bool) {
        if timed_out {
            warn!(
                event = "sampler_stopped",
                run_id = %self.run_id,
                ticks = ticks,
                timed_out = true,
                "Sampler did not stop in time, reporting partial timeline"
            );
        } else {
            info!(
                event = "sampler_stopped",
                run_id = %self.run_id,
                ticks = ticks,
                timed_out = false,
                "Sampler stopped"
            );
        }
    }

    /// Log report generation
    pub fn log_report(&self, path: &str, health: &str, ticks: usize) {
        info!(
            event = "report_written",
            run_id = %self.run_id,
            path = %path,
            health = %health,
            ticks = ticks,
            "Report written"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_metrics_creation() {
        let metrics = SamplerMetrics::new();

        let before = metrics.collector_fallbacks(collectors::NODES);
        metrics.observe_tick_latency(0.3);
        metrics.inc_collector_fallback(collectors::NODES);
        metrics.inc_exhaustion_ticks();
        metrics.set_pods_observed("web", 3);

        assert!(metrics.collector_fallbacks(collectors::NODES) > before);
        assert!(metrics.ticks_total() >= 1);

        let text = metrics.render_text();
        assert!(text.contains("scalewatch_ticks_total"));
        assert!(text.contains("scalewatch_collector_fallbacks_total"));
    }

    #[test]
    fn test_run_logger_creation() {
        let logger = RunLogger::new("run-42");
        assert_eq!(logger.run_id(), "run-42");
    }
}
