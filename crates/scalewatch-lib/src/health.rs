//! Pool health classification
//!
//! The classification is a label for the report only; it has no effect
//! on sampling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Utilization above which a pool without queued waiters counts as saturated
pub const SATURATION_THRESHOLD_PERCENT: f64 = 90.0;

/// Overall pool health over a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolHealth {
    /// Utilization stayed at or below the saturation threshold
    Healthy,
    /// No request ever waited, but utilization exceeded the threshold
    Saturated,
    /// At least one tick had requests waiting for a connection
    Exhausted,
}

impl PoolHealth {
    /// Classify a run from its worst waiting depth and peak utilization
    pub fn classify(max_waiting: u32, max_utilization_percent: f64) -> Self {
        if max_waiting > 0 {
            PoolHealth::Exhausted
        } else if max_utilization_percent > SATURATION_THRESHOLD_PERCENT {
            PoolHealth::Saturated
        } else {
            PoolHealth::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolHealth::Healthy => "Healthy",
            PoolHealth::Saturated => "Saturated",
            PoolHealth::Exhausted => "Exhausted",
        }
    }

    /// CSS color used by the report badge
    pub fn color(&self) -> &'static str {
        match self {
            PoolHealth::Healthy => "#2e7d32",
            PoolHealth::Saturated => "#ef6c00",
            PoolHealth::Exhausted => "#c62828",
        }
    }
}

impl fmt::Display for PoolHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_without_waiters() {
        assert_eq!(PoolHealth::classify(0, 95.0), PoolHealth::Saturated);
    }

    #[test]
    fn test_waiters_mean_exhausted_regardless_of_utilization() {
        assert_eq!(PoolHealth::classify(1, 10.0), PoolHealth::Exhausted);
        assert_eq!(PoolHealth::classify(12, 100.0), PoolHealth::Exhausted);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(PoolHealth::classify(0, 90.0), PoolHealth::Healthy);
        assert_eq!(PoolHealth::classify(0, 0.0), PoolHealth::Healthy);
    }
}
