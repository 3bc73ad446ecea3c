//! kubectl-backed cluster queries

use super::parse::{
    count_rows, derive_pod_label, parse_autoscaler_json, parse_deployment_json, parse_nodes,
    parse_pod_cpu,
};
use super::{ClusterQuery, CommandRunner};
use crate::models::{AutoscalerStatus, Collected, NodeStatus, ReplicaStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// [`ClusterQuery`] implementation that shells out to kubectl
pub struct KubectlClusterQuery {
    runner: Arc<dyn CommandRunner>,
}

impl KubectlClusterQuery {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Count pods matching a selector; used when the autoscaler lags
    async fn count_pods(&self, selector: &str) -> Option<u32> {
        match self
            .runner
            .run(&args(&["get", "pods", "-l", selector, "--no-headers"]))
            .await
        {
            Ok(output) => Some(count_rows(&output)),
            Err(e) => {
                debug!(selector = %selector, error = %e, "Pod count fallback failed");
                None
            }
        }
    }
}

#[async_trait]
impl ClusterQuery for KubectlClusterQuery {
    async fn query_autoscaler(&self, name: &str) -> Collected<AutoscalerStatus> {
        let output = match self.runner.run(&args(&["get", "hpa", name, "-o", "json"])).await {
            Ok(output) => output,
            Err(e) => return Collected::zeroed(e),
        };

        let mut status = match parse_autoscaler_json(&output) {
            Ok(status) => status,
            Err(e) => return Collected::zeroed(e),
        };

        // Autoscaler status trails reality under rapid scaling
        if status.replicas == 0 {
            let selector = derive_pod_label(name);
            if let Some(count) = self.count_pods(&selector).await {
                debug!(
                    autoscaler = %name,
                    selector = %selector,
                    pods = count,
                    "Autoscaler reported zero replicas, using pod count"
                );
                status.replicas = count;
            }
        }

        Collected::Fresh(status)
    }

    async fn query_deployment(&self, name: &str) -> Collected<ReplicaStatus> {
        let result = self
            .runner
            .run(&args(&["get", "deployment", name, "-o", "json"]))
            .await
            .and_then(|output| parse_deployment_json(&output));

        match result {
            Ok(status) => Collected::Fresh(status),
            Err(e) => Collected::zeroed(e),
        }
    }

    async fn query_pod_cpu(&self, selector: &str) -> Collected<BTreeMap<String, u32>> {
        match self
            .runner
            .run(&args(&["top", "pods", "-l", selector, "--no-headers"]))
            .await
        {
            Ok(output) => Collected::Fresh(parse_pod_cpu(&output)),
            Err(e) => Collected::zeroed(e),
        }
    }

    async fn query_nodes(&self) -> Collected<NodeStatus> {
        match self.runner.run(&args(&["get", "nodes", "--no-headers"])).await {
            Ok(output) => Collected::Fresh(parse_nodes(&output)),
            Err(e) => Collected::zeroed(e),
        }
    }
}
