//! Scalewatch library
//!
//! This crate provides the core functionality for:
//! - Querying autoscaler, deployment, pod and node state through kubectl
//! - Scraping connection-pool exhaustion events from application logs
//! - Background sampling of both signals on a fixed cadence
//! - Building a time-correlated report from the sampled timeline

pub mod cluster;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pool;
pub mod report;
pub mod sampler;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use error::{CollectorError, TimelineError};
pub use health::PoolHealth;
pub use models::*;
pub use observability::{RunLogger, SamplerMetrics};
pub use timeline::TimelineStore;
