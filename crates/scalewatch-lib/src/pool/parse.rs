//! Pool exhaustion log line parsing

use crate::models::{PoolEvent, DEFAULT_POOL_CAPACITY};
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Phrase HikariCP logs when a connection request times out on an exhausted pool
pub const DEFAULT_EXHAUSTION_MARKER: &str = "Connection is not available";

static TIMESTAMP_PREFIX: OnceLock<Regex> = OnceLock::new();

fn timestamp_prefix() -> &'static Regex {
    TIMESTAMP_PREFIX.get_or_init(|| {
        Regex::new(r"^\s*(\d{4}-\d{2}-\d{2})[T ](\d{2}:\d{2}:\d{2})(?:[.,](\d{1,9}))?")
            .expect("timestamp regex is valid")
    })
}

/// Leading ISO-like date-time of a log line
fn parse_timestamp(line: &str) -> Option<NaiveDateTime> {
    let caps = timestamp_prefix().captures(line)?;
    let fraction = caps.get(3).map(|m| m.as_str()).unwrap_or("0");
    let normalized = format!("{} {}.{}", &caps[1], &caps[2], fraction);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f").ok()
}

/// Trailing `(key=value, ...)` list of a log line
fn parse_counters(line: &str) -> Option<HashMap<String, u32>> {
    let open = line.rfind('(')?;
    let close = open + line[open..].find(')')?;
    let inner = &line[open + 1..close];

    let mut counters = HashMap::new();
    for pair in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=')?;
        counters.insert(key.trim().to_string(), value.trim().parse().ok()?);
    }
    Some(counters)
}

/// Parse a single exhaustion line
///
/// Returns `None` when the line has no leading timestamp or its counter
/// list is missing or non-numeric.
pub fn parse_pool_line(line: &str) -> Option<PoolEvent> {
    let ts = parse_timestamp(line)?;
    let counters = parse_counters(line)?;
    let get = |key: &str, default: u32| counters.get(key).copied().unwrap_or(default);

    Some(PoolEvent {
        ts,
        total: get("total", DEFAULT_POOL_CAPACITY),
        active: get("active", 0),
        idle: get("idle", 0),
        waiting: get("waiting", 0),
    })
}
