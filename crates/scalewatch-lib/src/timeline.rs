//! Append-only per-tick timeline
//!
//! A [`TimelineStore`] holds every record one test run produced, in tick
//! order. The sampler never shares it while running: ticks are handed
//! over a channel and drained into the store by its owner once sampling
//! has stopped, so there is exactly one writer and no reader until then.

use crate::error::TimelineError;
use crate::models::{PoolSample, Snapshot, TickRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Ordered sequence of tick records for one test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStore {
    /// Nominal poll interval in seconds
    interval_secs: f64,
    ticks: Vec<TickRecord>,
}

impl TimelineStore {
    /// Create an empty timeline for the given poll interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_secs: interval.as_secs_f64(),
            ticks: Vec::new(),
        }
    }

    /// Append the next tick. Elapsed time may not go backwards.
    pub fn append(&mut self, record: TickRecord) -> Result<(), TimelineError> {
        if let Some(last) = self.ticks.last() {
            let previous = last.snapshot.elapsed_seconds;
            let next = record.snapshot.elapsed_seconds;
            if next < previous {
                return Err(TimelineError::OutOfOrder { previous, next });
            }
        }
        self.ticks.push(record);
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn ticks(&self) -> &[TickRecord] {
        &self.ticks
    }

    pub fn get(&self, tick: usize) -> Option<&TickRecord> {
        self.ticks.get(tick)
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        self.ticks.iter().map(|t| &t.snapshot)
    }

    pub fn pool_samples(&self) -> impl Iterator<Item = &PoolSample> + '_ {
        self.ticks.iter().map(|t| &t.pool)
    }

    /// Nominal test duration: tick count times the poll interval
    pub fn duration_secs(&self) -> f64 {
        self.ticks.len() as f64 * self.interval_secs
    }

    /// Serialize the raw tick sequence for downstream analysis
    pub fn to_json(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a timeline previously written by [`TimelineStore::to_json`]
    ///
    /// Records are re-appended so ordering is validated on the way in.
    pub fn from_json(content: &str) -> Result<Self, TimelineError> {
        let raw: TimelineStore = serde_json::from_str(content)?;
        if !raw.interval_secs.is_finite() || raw.interval_secs <= 0.0 {
            return Err(TimelineError::InvalidInterval(raw.interval_secs));
        }

        let mut store = TimelineStore {
            interval_secs: raw.interval_secs,
            ticks: Vec::with_capacity(raw.ticks.len()),
        };
        for record in raw.ticks {
            store.append(record)?;
        }
        Ok(store)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), TimelineError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self, TimelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeStatus, PoolSource, PoolStats};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(elapsed_seconds: f64, waiting: u32) -> TickRecord {
        TickRecord {
            snapshot: Snapshot {
                elapsed_seconds,
                captured_at: Utc::now(),
                nodes: NodeStatus { total: 3, ready: 3 },
                deployments: BTreeMap::new(),
            },
            pool: PoolSample {
                elapsed_seconds,
                stats: PoolStats {
                    waiting,
                    ..PoolStats::healthy_default(PoolSource::NoEvents)
                },
            },
        }
    }

    #[test]
    fn test_append_in_order() {
        let mut store = TimelineStore::new(Duration::from_secs(2));
        store.append(record(0.0, 0)).unwrap();
        store.append(record(2.0, 1)).unwrap();
        store.append(record(2.0, 0)).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.duration_secs(), 6.0);
        assert_eq!(store.get(1).unwrap().pool.stats.waiting, 1);
    }

    #[test]
    fn test_append_rejects_backwards_elapsed() {
        let mut store = TimelineStore::new(Duration::from_secs(2));
        store.append(record(4.0, 0)).unwrap();

        let result = store.append(record(2.0, 0));
        assert!(matches!(result, Err(TimelineError::OutOfOrder { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timeline.json");

        let mut store = TimelineStore::new(Duration::from_millis(2500));
        store.append(record(0.0, 0)).unwrap();
        store.append(record(2.5, 4)).unwrap();
        store.write_json(&path).unwrap();

        let loaded = TimelineStore::read_json(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_pool_sample_json_is_flat() {
        let json = serde_json::to_value(record(2.0, 3).pool).unwrap();
        assert_eq!(json["waiting"], 3);
        assert_eq!(json["capacity"], 10);
        assert_eq!(json["source"], "no_events");
    }

    #[test]
    fn test_from_json_rejects_bad_interval() {
        let content = r#"{"interval_secs": 0.0, "ticks": []}"#;
        assert!(matches!(
            TimelineStore::from_json(content),
            Err(TimelineError::InvalidInterval(_))
        ));
    }
}
