//! Parsers for kubectl output
//!
//! Tabular output is parsed row by row: a row that does not match the
//! expected shape is dropped, never zero-filled. JSON output is read
//! through `serde_json::Value` so unknown or reshaped fields degrade to
//! defaults instead of failing deserialization.

use crate::error::CollectorError;
use crate::models::{AutoscalerStatus, NodeStatus, ReplicaStatus};
use serde_json::Value;
use std::collections::BTreeMap;

/// Suffixes stripped from an autoscaler name to recover the app label
const AUTOSCALER_SUFFIXES: &[&str] = &["-hpa", "-autoscaler"];

/// Prefixes stripped from an autoscaler name to recover the app label
const AUTOSCALER_PREFIXES: &[&str] = &["hpa-"];

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().map(|v| v.min(u32::MAX as u64) as u32)
}

/// Parse `kubectl get hpa <name> -o json`
///
/// Supports both the autoscaling/v1 `currentCPUUtilizationPercentage`
/// field and the autoscaling/v2 `currentMetrics` list.
pub fn parse_autoscaler_json(content: &str) -> Result<AutoscalerStatus, CollectorError> {
    let doc: Value =
        serde_json::from_str(content).map_err(|e| CollectorError::parse("autoscaler", e))?;
    let status = doc
        .get("status")
        .filter(|s| s.is_object())
        .ok_or_else(|| CollectorError::parse("autoscaler", "missing status"))?;

    let replicas = status.get("currentReplicas").and_then(as_u32).unwrap_or(0);

    let cpu_percent = status
        .get("currentCPUUtilizationPercentage")
        .and_then(as_u32)
        .or_else(|| {
            status
                .get("currentMetrics")?
                .as_array()?
                .iter()
                .filter(|m| m.get("type").and_then(Value::as_str) == Some("Resource"))
                .filter_map(|m| m.get("resource"))
                .find(|r| r.get("name").and_then(Value::as_str) == Some("cpu"))
                .and_then(|r| r.get("current")?.get("averageUtilization"))
                .and_then(as_u32)
        })
        .unwrap_or(0);

    Ok(AutoscalerStatus {
        replicas,
        cpu_percent,
    })
}

/// Parse `kubectl get deployment <name> -o json`
pub fn parse_deployment_json(content: &str) -> Result<ReplicaStatus, CollectorError> {
    let doc: Value =
        serde_json::from_str(content).map_err(|e| CollectorError::parse("deployment", e))?;
    let spec = doc
        .get("spec")
        .filter(|s| s.is_object())
        .ok_or_else(|| CollectorError::parse("deployment", "missing spec"))?;

    let desired = spec.get("replicas").and_then(as_u32).unwrap_or(0);
    // A freshly scaled-to-zero deployment omits status fields entirely
    let ready = doc
        .get("status")
        .and_then(|s| s.get("readyReplicas"))
        .and_then(as_u32)
        .unwrap_or(0);

    Ok(ReplicaStatus { desired, ready })
}

/// Convert a `kubectl top` CPU column value to millicores
///
/// `493m` is millicores; a bare number is whole cores.
pub fn parse_cpu_token(token: &str) -> Option<u32> {
    if let Some(milli) = token.strip_suffix('m') {
        return milli.parse::<u32>().ok();
    }
    if let Ok(cores) = token.parse::<u32>() {
        return Some(cores.saturating_mul(1000));
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite() && *c >= 0.0)
        .map(|c| (c * 1000.0).round().min(u32::MAX as f64) as u32)
}

/// Parse `kubectl top pods --no-headers` into pod name -> millicores
pub fn parse_pod_cpu(content: &str) -> BTreeMap<String, u32> {
    let mut usage = BTreeMap::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        if let Some(millicores) = parse_cpu_token(parts[1]) {
            usage.insert(parts[0].to_string(), millicores);
        }
    }

    usage
}

/// Parse `kubectl get nodes --no-headers`
pub fn parse_nodes(content: &str) -> NodeStatus {
    let mut status = NodeStatus::default();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        status.total += 1;
        if line.split_whitespace().any(|token| token == "Ready") {
            status.ready += 1;
        }
    }

    status
}

/// Number of non-empty rows in a `--no-headers` listing
pub fn count_rows(content: &str) -> u32 {
    content.lines().filter(|l| !l.trim().is_empty()).count() as u32
}

/// Derive the pod label selector for an autoscaler name
///
/// `web-hpa` and `hpa-web` both map to `app=web`.
pub fn derive_pod_label(autoscaler: &str) -> String {
    let mut app = autoscaler;
    for suffix in AUTOSCALER_SUFFIXES {
        if let Some(stripped) = app.strip_suffix(suffix) {
            app = stripped;
            break;
        }
    }
    for prefix in AUTOSCALER_PREFIXES {
        if let Some(stripped) = app.strip_prefix(prefix) {
            app = stripped;
            break;
        }
    }
    format!("app={}", app)
}
