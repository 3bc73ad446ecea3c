//! CLI command implementations

pub mod probe;
pub mod report;
pub mod run;

use crate::config::ScalewatchConfig;
use anyhow::Result;
use scalewatch_lib::cluster::{KubectlClusterQuery, KubectlRunner};
use scalewatch_lib::pool::LogMetricScraper;
use scalewatch_lib::sampler::{Sampler, SamplerBuilder};
use std::sync::Arc;

/// Wire kubectl-backed collectors into a sampler
pub fn build_sampler(config: &ScalewatchConfig) -> Result<Sampler> {
    config.validate()?;
    let deployments = config.monitored_deployments();
    if deployments.is_empty() {
        anyhow::bail!("No deployments configured; pass --deployment or add [[deployments]] to the config file");
    }

    let runner = Arc::new(KubectlRunner::new(config.runner_config()?));
    let cluster = Arc::new(KubectlClusterQuery::new(runner.clone()));
    let pool = Arc::new(LogMetricScraper::new(runner, config.pool_scraper_config()?));

    deployments
        .into_iter()
        .fold(SamplerBuilder::new(), |builder, deployment| {
            builder.deployment(deployment)
        })
        .cluster(cluster)
        .pool(pool)
        .interval(config.interval()?)
        .log_window_slack(config.log_window_slack()?)
        .build()
}
