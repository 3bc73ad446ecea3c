//! Background sampling loop
//!
//! Runs a single tokio task that, on a fixed interval, queries every
//! monitored deployment, the node list and the pool log window, and
//! emits one [`TickRecord`] per tick. Collectors inside a tick run one
//! after another. The sleep between ticks is not shortened by the time
//! the tick itself took, so the observed cadence runs slower than the
//! nominal interval by the tick latency; `elapsed_seconds` is always the
//! nominal `tick × interval` and `captured_at` carries the real time.
//!
//! Cancellation is cooperative: [`SamplerHandle::stop`] raises a flag that
//! the loop checks before starting each tick, then waits a bounded time
//! for the task to exit. A tick that has started always completes.

mod handle;


pub use handle::{CancellationFlag, SamplerHandle, ShutdownStatus, StopOutcome};

use crate::cluster::ClusterQuery;
use crate::models::{
    Collected, DeploymentStatus, MonitoredDeployment, PoolSample, PoolSource, Snapshot, TickRecord,
};
use crate::observability::{collectors, SamplerMetrics};
use crate::pool::PoolSignal;
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default poll interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Extra log window on top of the interval so lines written while the
/// previous tick was running are not missed
pub const DEFAULT_LOG_WINDOW_SLACK: Duration = Duration::from_secs(5);

/// Configuration for the sampling loop
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Nominal interval between ticks
    pub interval: Duration,
    /// Added to the interval to size the pool log window
    pub log_window_slack: Duration,
    /// Deployments queried every tick
    pub deployments: Vec<MonitoredDeployment>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            log_window_slack: DEFAULT_LOG_WINDOW_SLACK,
            deployments: Vec::new(),
        }
    }
}

impl SamplerConfig {
    /// Log window scanned by each tick's pool aggregation
    pub fn log_window(&self) -> Duration {
        self.interval + self.log_window_slack
    }

    /// Upper bound on kubectl calls in one tick: per deployment the
    /// autoscaler (plus its pod-count fallback), the deployment and pod
    /// CPU, then nodes and the pool logs.
    pub fn max_calls_per_tick(&self) -> u32 {
        self.deployments.len() as u32 * 4 + 2
    }

    /// Longest a healthy loop can take to exit after cancellation: a tick
    /// whose every call runs to `command_timeout`, then the full sleep.
    pub fn stop_budget(&self, command_timeout: Duration) -> Duration {
        self.interval + command_timeout * self.max_calls_per_tick()
    }
}

/// Periodic sampler of cluster and pool state
pub struct Sampler {
    cluster: Arc<dyn ClusterQuery>,
    pool: Arc<dyn PoolSignal>,
    config: SamplerConfig,
    metrics: SamplerMetrics,
}

impl Sampler {
    pub fn new(
        cluster: Arc<dyn ClusterQuery>,
        pool: Arc<dyn PoolSignal>,
        config: SamplerConfig,
    ) -> Self {
        Self {
            cluster,
            pool,
            config,
            metrics: SamplerMetrics::new(),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Start the loop on a background task
    pub fn spawn(self) -> SamplerHandle {
        let cancel = CancellationFlag::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let interval = self.config.interval;
        let metrics = self.metrics.clone();
        let task = tokio::spawn(self.run(cancel.clone(), tx));

        SamplerHandle::new(cancel, task, rx, interval, metrics)
    }

    /// Collect a single tick outside the loop
    pub async fn sample_once(&self) -> TickRecord {
        self.sample_tick(0).await
    }

    async fn run(self, cancel: CancellationFlag, tx: mpsc::UnboundedSender<TickRecord>) {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            deployments = self.config.deployments.len(),
            "Starting sampler loop"
        );

        let mut tick = 0u64;
        loop {
            if cancel.is_cancelled() {
                info!(ticks = tick, "Sampler loop observed cancellation");
                break;
            }

            let start = Instant::now();
            let record = self.sample_tick(tick).await;
            let elapsed = start.elapsed();
            self.metrics.observe_tick_latency(elapsed.as_secs_f64());

            debug!(
                tick = tick,
                elapsed_secs = record.snapshot.elapsed_seconds,
                latency_ms = elapsed.as_millis() as u64,
                nodes_ready = record.snapshot.nodes.ready,
                pool_waiting = record.pool.stats.waiting,
                "Tick complete"
            );

            if tx.send(record).is_err() {
                warn!(tick = tick, "Timeline receiver dropped, stopping sampler");
                break;
            }

            tick += 1;
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Gather one tick's records, collectors in sequence
    async fn sample_tick(&self, tick: u64) -> TickRecord {
        let captured_at = Utc::now();
        let elapsed_seconds = tick as f64 * self.config.interval.as_secs_f64();

        let mut deployments = BTreeMap::new();
        for deployment in &self.config.deployments {
            let status = self.sample_deployment(deployment).await;
            self.metrics
                .set_pods_observed(&deployment.name, status.pod_cpu_millicores.len() as i64);
            deployments.insert(deployment.name.clone(), status);
        }

        let nodes = self.unwrap_collected(
            collectors::NODES,
            "nodes",
            self.cluster.query_nodes().await,
        );

        let stats = self
            .pool
            .aggregate_pool_window(self.config.log_window())
            .await;
        if stats.source == PoolSource::Unavailable {
            self.metrics.inc_collector_fallback(collectors::POOL_LOGS);
        }
        if stats.waiting > 0 {
            self.metrics.inc_exhaustion_ticks();
            info!(
                tick = tick,
                waiting = stats.waiting,
                active = stats.active,
                capacity = stats.capacity,
                "Connection pool exhausted during tick"
            );
        }

        TickRecord {
            snapshot: Snapshot {
                elapsed_seconds,
                captured_at,
                nodes,
                deployments,
            },
            pool: PoolSample {
                elapsed_seconds,
                stats,
            },
        }
    }

    async fn sample_deployment(&self, deployment: &MonitoredDeployment) -> DeploymentStatus {
        let autoscaler = self.unwrap_collected(
            collectors::AUTOSCALER,
            &deployment.autoscaler,
            self.cluster.query_autoscaler(&deployment.autoscaler).await,
        );
        let replicas = self.unwrap_collected(
            collectors::DEPLOYMENT,
            &deployment.name,
            self.cluster.query_deployment(&deployment.name).await,
        );
        let pod_cpu_millicores = self.unwrap_collected(
            collectors::POD_CPU,
            &deployment.selector,
            self.cluster.query_pod_cpu(&deployment.selector).await,
        );

        DeploymentStatus {
            desired_replicas: replicas.desired,
            ready_replicas: replicas.ready,
            hpa_replicas: autoscaler.replicas,
            hpa_cpu_percent: autoscaler.cpu_percent,
            pod_cpu_millicores,
        }
    }

    /// Take the value out of a collector result, counting fallbacks
    fn unwrap_collected<T>(&self, collector: &str, target: &str, result: Collected<T>) -> T {
        if let Some(reason) = result.reason() {
            self.metrics.inc_collector_fallback(collector);
            debug!(
                collector = collector,
                target = %target,
                error = %reason,
                "Collector fell back to defaults"
            );
        }
        result.into_value()
    }
}

/// Builder for creating a sampler
pub struct SamplerBuilder {
    cluster: Option<Arc<dyn ClusterQuery>>,
    pool: Option<Arc<dyn PoolSignal>>,
    config: SamplerConfig,
}

impl SamplerBuilder {
    pub fn new() -> Self {
        Self {
            cluster: None,
            pool: None,
            config: SamplerConfig::default(),
        }
    }

    /// Set the cluster query implementation
    pub fn cluster(mut self, cluster: Arc<dyn ClusterQuery>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Set the pool signal source
    pub fn pool(mut self, pool: Arc<dyn PoolSignal>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the poll interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the extra log window added to each tick's scrape
    pub fn log_window_slack(mut self, slack: Duration) -> Self {
        self.config.log_window_slack = slack;
        self
    }

    /// Add a deployment to monitor
    pub fn deployment(mut self, deployment: MonitoredDeployment) -> Self {
        self.config.deployments.push(deployment);
        self
    }

    /// Build the sampler
    pub fn build(self) -> Result<Sampler> {
        let cluster = self
            .cluster
            .ok_or_else(|| anyhow::anyhow!("Cluster query is required"))?;
        let pool = self
            .pool
            .ok_or_else(|| anyhow::anyhow!("Pool signal is required"))?;
        if self.config.interval.is_zero() {
            anyhow::bail!("Sampling interval must be greater than zero");
        }

        Ok(Sampler::new(cluster, pool, self.config))
    }
}

impl Default for SamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
