//! Core data models for sampled cluster state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CollectorError;

/// Pool capacity assumed when a log line or sample does not report one
pub const DEFAULT_POOL_CAPACITY: u32 = 10;

/// Node counts reported by the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub total: u32,
    pub ready: u32,
}

/// Replica state of a single monitored deployment during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub desired_replicas: u32,
    pub ready_replicas: u32,
    /// Replica count as reported by the autoscaler (after pod-count fallback)
    pub hpa_replicas: u32,
    pub hpa_cpu_percent: u32,
    /// Pod name -> CPU usage in millicores. Keys churn between ticks.
    pub pod_cpu_millicores: BTreeMap<String, u32>,
}

/// One tick's cluster-wide record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick index multiplied by the nominal poll interval
    pub elapsed_seconds: f64,
    /// Wall-clock time the tick started
    pub captured_at: DateTime<Utc>,
    pub nodes: NodeStatus,
    pub deployments: BTreeMap<String, DeploymentStatus>,
}

/// Where a tick's pool numbers came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSource {
    /// At least one exhaustion line was seen in the window
    Observed,
    /// Logs were readable and contained no exhaustion lines
    #[default]
    NoEvents,
    /// Logs could not be fetched; numbers are the healthy default
    Unavailable,
}

/// Aggregated pool counters for one sampling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub capacity: u32,
    pub active: u32,
    pub idle: u32,
    pub waiting: u32,
    #[serde(default)]
    pub source: PoolSource,
}

impl PoolStats {
    /// Healthy default used when no exhaustion lines are present
    pub fn healthy_default(source: PoolSource) -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            active: 0,
            idle: DEFAULT_POOL_CAPACITY,
            waiting: 0,
            source,
        }
    }
}

/// One tick's resource-contention record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSample {
    pub elapsed_seconds: f64,
    #[serde(flatten)]
    pub stats: PoolStats,
}

/// Everything a single sampler tick produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub snapshot: Snapshot,
    pub pool: PoolSample,
}

/// A single pool-exhaustion event parsed from a log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEvent {
    pub ts: chrono::NaiveDateTime,
    pub total: u32,
    pub active: u32,
    pub idle: u32,
    pub waiting: u32,
}

/// Replica counts reported by the autoscaler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoscalerStatus {
    pub replicas: u32,
    pub cpu_percent: u32,
}

/// Desired and ready replicas of a deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaStatus {
    pub desired: u32,
    pub ready: u32,
}

/// A deployment watched by the sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredDeployment {
    /// Deployment name
    pub name: String,
    /// HorizontalPodAutoscaler name
    pub autoscaler: String,
    /// Label selector matching the deployment's pods
    pub selector: String,
}

impl MonitoredDeployment {
    /// Monitor a deployment whose HPA shares its name and whose pods carry `app=<name>`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            autoscaler: name.clone(),
            selector: format!("app={}", name),
            name,
        }
    }
}

/// Result of a collector call: always carries a usable value
#[derive(Debug)]
pub enum Collected<T> {
    /// Value parsed from a successful query
    Fresh(T),
    /// Default substituted because the query failed
    Fallback { value: T, reason: CollectorError },
}

impl<T> Collected<T> {
    pub fn fallback(value: T, reason: CollectorError) -> Self {
        Collected::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Collected::Fresh(value) | Collected::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Collected::Fresh(value) | Collected::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Collected::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&CollectorError> {
        match self {
            Collected::Fresh(_) => None,
            Collected::Fallback { reason, .. } => Some(reason),
        }
    }
}

impl<T: Default> Collected<T> {
    /// Substitute the type's zero value for a failed query
    pub fn zeroed(reason: CollectorError) -> Self {
        Collected::Fallback {
            value: T::default(),
            reason,
        }
    }
}
