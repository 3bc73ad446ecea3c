//! Connection-pool contention signal scraped from application logs
//!
//! The application only logs when its pool runs dry, so the signal is
//! derived from exhaustion lines in a recent log window. A window with
//! no such lines is reported as a healthy pool.

mod parse;


pub use parse::{parse_pool_line, DEFAULT_EXHAUSTION_MARKER};

use crate::cluster::CommandRunner;
use crate::models::{Collected, PoolEvent, PoolSource, PoolStats};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of the per-tick pool signal
#[async_trait]
pub trait PoolSignal: Send + Sync {
    /// Aggregate all exhaustion events seen in the last `window`
    async fn aggregate_pool_window(&self, window: Duration) -> PoolStats;
}

/// Configuration for the log scraper
#[derive(Debug, Clone)]
pub struct PoolScraperConfig {
    /// Label selector of the pods whose logs are scraped
    pub selector: String,
    /// Phrase identifying a pool-exhausted line
    pub marker: String,
    /// Concurrent log streams kubectl may open
    pub max_log_requests: u32,
}

impl PoolScraperConfig {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            marker: DEFAULT_EXHAUSTION_MARKER.to_string(),
            max_log_requests: 10,
        }
    }
}

/// Reads recent pod logs and extracts pool-exhaustion events
pub struct LogMetricScraper {
    runner: Arc<dyn CommandRunner>,
    config: PoolScraperConfig,
}

impl LogMetricScraper {
    pub fn new(runner: Arc<dyn CommandRunner>, config: PoolScraperConfig) -> Self {
        Self { runner, config }
    }

    /// Fetch exhaustion events logged within the last `window`, oldest first
    pub async fn fetch_recent_pool_events(&self, window: Duration) -> Collected<Vec<PoolEvent>> {
        let since_secs = window.as_secs_f64().ceil().max(1.0) as u64;
        let args = vec![
            "logs".to_string(),
            "-l".to_string(),
            self.config.selector.clone(),
            format!("--since={}s", since_secs),
            "--tail=-1".to_string(),
            format!("--max-log-requests={}", self.config.max_log_requests),
        ];

        let output = match self.runner.run(&args).await {
            Ok(output) => output,
            Err(e) => return Collected::zeroed(e),
        };

        let mut skipped = 0usize;
        let mut events: Vec<PoolEvent> = output
            .lines()
            .filter(|line| line.contains(&self.config.marker) && line.contains("waiting="))
            .filter_map(|line| {
                let event = parse_pool_line(line);
                if event.is_none() {
                    skipped += 1;
                }
                event
            })
            .collect();

        if skipped > 0 {
            debug!(
                selector = %self.config.selector,
                skipped = skipped,
                "Skipped malformed pool exhaustion lines"
            );
        }

        // Logs from several pods arrive grouped by pod, not by time
        events.sort_by_key(|e| e.ts);
        Collected::Fresh(events)
    }
}

#[async_trait]
impl PoolSignal for LogMetricScraper {
    async fn aggregate_pool_window(&self, window: Duration) -> PoolStats {
        let events = self.fetch_recent_pool_events(window).await;
        if let Some(reason) = events.reason() {
            debug!(error = %reason, "Pool log window unavailable");
            return PoolStats::healthy_default(PoolSource::Unavailable);
        }
        aggregate_events(events.value())
    }
}

/// Collapse a window of events into one sample
///
/// `waiting` and `active` take the maximum over the window so that a
/// transient spike between ticks is not lost; `capacity` and `idle`
/// describe the pool as of the chronologically last event.
pub fn aggregate_events(events: &[PoolEvent]) -> PoolStats {
    let Some(last) = events.iter().max_by_key(|e| e.ts) else {
        return PoolStats::healthy_default(PoolSource::NoEvents);
    };

    PoolStats {
        capacity: last.total,
        active: events.iter().map(|e| e.active).max().unwrap_or(0),
        idle: last.idle,
        waiting: events.iter().map(|e| e.waiting).max().unwrap_or(0),
        source: PoolSource::Observed,
    }
}
