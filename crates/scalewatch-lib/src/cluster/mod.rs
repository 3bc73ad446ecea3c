//! Read-only cluster queries
//!
//! This module issues queries against the orchestrator for autoscaler
//! status, deployment replicas, per-pod CPU and node readiness. Every
//! query returns a [`Collected`] value: either freshly parsed output or a
//! zero/default substitute with the reason attached. Nothing here returns
//! an error to the caller, so the sampling loop keeps running while the
//! cluster is unreachable.

mod kubectl;
mod parse;
mod runner;


pub use kubectl::KubectlClusterQuery;
pub use parse::{
    count_rows, derive_pod_label, parse_autoscaler_json, parse_cpu_token, parse_deployment_json,
    parse_nodes, parse_pod_cpu,
};
pub use runner::{CommandRunner, KubectlRunner, KubectlRunnerConfig};

use crate::models::{AutoscalerStatus, Collected, NodeStatus, ReplicaStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Trait for cluster state queries
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// Current replica count and CPU utilization reported by an autoscaler
    async fn query_autoscaler(&self, name: &str) -> Collected<AutoscalerStatus>;

    /// Desired and ready replicas of a deployment
    async fn query_deployment(&self, name: &str) -> Collected<ReplicaStatus>;

    /// CPU usage in millicores for every pod matching a label selector
    async fn query_pod_cpu(&self, selector: &str) -> Collected<BTreeMap<String, u32>>;

    /// Total and ready node counts
    async fn query_nodes(&self) -> Collected<NodeStatus>;
}
