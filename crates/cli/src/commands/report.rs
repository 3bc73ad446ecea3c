//! Offline report rendering

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use scalewatch_lib::report::ReportBuilder;
use scalewatch_lib::{RunLogger, TimelineStore};
use std::path::{Path, PathBuf};

/// Render an HTML report from a saved timeline
pub fn report(
    timeline_path: &Path,
    output_path: Option<PathBuf>,
    title: &str,
    format: OutputFormat,
) -> Result<()> {
    let timeline = TimelineStore::read_json(timeline_path)
        .with_context(|| format!("Failed to read timeline {}", timeline_path.display()))?;

    let output_path = output_path.unwrap_or_else(|| {
        timeline_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("report.html")
    });

    let report = ReportBuilder::new(title).build(&timeline);
    report.write_html(&output_path)?;

    let run_id = timeline_path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "offline".to_string());
    RunLogger::new(run_id).log_report(
        &output_path.display().to_string(),
        report.summary.health.as_str(),
        timeline.len(),
    );

    output::print_summary(&report.summary, format);
    if let OutputFormat::Table = format {
        output::print_success(&format!("Report written to {}", output_path.display()));
    }
    Ok(())
}
