//! Single-sample probe

use crate::commands::build_sampler;
use crate::config::ScalewatchConfig;
use crate::output::{self, OutputFormat};
use anyhow::Result;

/// Collect one tick and print it, to check cluster access before a run
pub async fn probe(config: &ScalewatchConfig, format: OutputFormat) -> Result<()> {
    let sampler = build_sampler(config)?;
    let record = sampler.sample_once().await;
    output::print_tick(&record, format);
    Ok(())
}
