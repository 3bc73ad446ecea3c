//! Load test run: sample while the load generator runs, then report

use crate::commands::build_sampler;
use crate::config::ScalewatchConfig;
use crate::load::run_load_generator;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::Utc;
use scalewatch_lib::report::{ReportBuilder, ReportSummary};
use scalewatch_lib::sampler::ShutdownStatus;
use scalewatch_lib::{RunLogger, SamplerMetrics, TimelineStore};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Artifact names inside a run directory
pub const TIMELINE_FILE: &str = "timeline.json";
pub const REPORT_FILE: &str = "report.html";
pub const METRICS_FILE: &str = "sampler_metrics.prom";

/// Run the load generator under observation and write the run's artifacts
pub async fn run(config: &ScalewatchConfig, load_command: &[String], format: OutputFormat) -> Result<PathBuf> {
    let sampler = build_sampler(config)?;
    let shutdown_timeout = config.shutdown_timeout()?;

    let run_id = format!("run-{}", Utc::now().format("%Y%m%dT%H%M%SZ"));
    let run_dir = config.output_dir.join(&run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create output directory {}", run_dir.display()))?;

    let logger = RunLogger::new(&run_id);
    let names: Vec<String> = sampler
        .config()
        .deployments
        .iter()
        .map(|d| d.name.clone())
        .collect();
    logger.log_run_start(sampler.config().interval.as_secs_f64(), &names);
    if let OutputFormat::Table = format {
        output::print_info(&format!("Sampling {} while running: {}", names.join(", "), load_command.join(" ")));
    }

    let handle = sampler.spawn();

    // The sampler must be stopped even when the load generator cannot start.
    let load = run_load_generator(load_command).await;
    let stopped = handle.stop(shutdown_timeout).await;

    match &load {
        Ok(outcome) => {
            logger.log_load_finished(outcome.success(), &outcome.describe());
            if !outcome.success() {
                output::print_warning(&format!("Load generator {}", outcome.describe()));
            }
        }
        Err(e) => {
            logger.log_load_finished(false, &format!("{:#}", e));
            output::print_warning(&format!("Load generator failed: {:#}", e));
        }
    }

    let timeline = stopped.timeline;
    let timed_out = matches!(stopped.shutdown, ShutdownStatus::TimedOut(_));
    logger.log_shutdown(timeline.len(), timed_out);
    if timed_out {
        output::print_warning("Sampler did not stop in time; the report covers the ticks completed so far");
    }

    let (report_path, summary) = write_artifacts(&run_dir, &config.title, &timeline, &logger)?;

    output::print_summary(&summary, format);
    if let OutputFormat::Table = format {
        output::print_success(&format!("Report written to {}", report_path.display()));
    }

    Ok(run_dir)
}

/// Write the report, then the timeline and metrics exports
///
/// Only a failed report write is an error; the raw exports are best effort.
fn write_artifacts(
    run_dir: &Path,
    title: &str,
    timeline: &TimelineStore,
    logger: &RunLogger,
) -> Result<(PathBuf, ReportSummary)> {
    let report = ReportBuilder::new(title).build(timeline);
    let report_path = run_dir.join(REPORT_FILE);
    report.write_html(&report_path)?;
    logger.log_report(
        &report_path.display().to_string(),
        report.summary.health.as_str(),
        timeline.len(),
    );

    let timeline_path = run_dir.join(TIMELINE_FILE);
    if let Err(e) = timeline.write_json(&timeline_path) {
        warn!(path = %timeline_path.display(), error = %e, "Failed to write timeline");
        output::print_warning(&format!("Failed to write {}: {}", timeline_path.display(), e));
    }

    let metrics_path = run_dir.join(METRICS_FILE);
    if let Err(e) = std::fs::write(&metrics_path, SamplerMetrics::new().render_text()) {
        warn!(path = %metrics_path.display(), error = %e, "Failed to write sampler metrics");
        output::print_warning(&format!("Failed to write {}: {}", metrics_path.display(), e));
    }

    Ok((report_path, report.summary))
}
