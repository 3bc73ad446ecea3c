//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use scalewatch_lib::report::ReportSummary;
use scalewatch_lib::{PoolHealth, PoolSource, TickRecord};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message to stderr so JSON output stays parseable
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format millicores as human-readable string
pub fn format_cpu(millicores: u32) -> String {
    if millicores >= 1000 {
        format!("{:.1}", millicores as f64 / 1000.0)
    } else {
        format!("{}m", millicores)
    }
}

/// Color a pool health verdict
pub fn color_health(health: PoolHealth) -> String {
    let label = health.as_str();
    match health {
        PoolHealth::Healthy => label.green().to_string(),
        PoolHealth::Saturated => label.yellow().to_string(),
        PoolHealth::Exhausted => label.red().bold().to_string(),
    }
}

fn pool_source_label(source: PoolSource) -> &'static str {
    match source {
        PoolSource::Observed => "observed",
        PoolSource::NoEvents => "no events",
        PoolSource::Unavailable => "unavailable",
    }
}

#[derive(Tabled, Serialize)]
struct DeploymentRow {
    #[tabled(rename = "DEPLOYMENT")]
    name: String,
    #[tabled(rename = "READY")]
    ready: String,
    #[tabled(rename = "HPA REPLICAS")]
    hpa_replicas: u32,
    #[tabled(rename = "HPA CPU")]
    hpa_cpu: String,
    #[tabled(rename = "PODS")]
    pods: usize,
    #[tabled(rename = "POD CPU")]
    pod_cpu: String,
}

/// Print one sampled tick
pub fn print_tick(record: &TickRecord, format: OutputFormat) {
    if let OutputFormat::Json = format {
        if let Ok(json) = serde_json::to_string_pretty(record) {
            println!("{}", json);
        }
        return;
    }

    let rows: Vec<DeploymentRow> = record
        .snapshot
        .deployments
        .iter()
        .map(|(name, status)| DeploymentRow {
            name: name.clone(),
            ready: format!("{}/{}", status.ready_replicas, status.desired_replicas),
            hpa_replicas: status.hpa_replicas,
            hpa_cpu: format!("{}%", status.hpa_cpu_percent),
            pods: status.pod_cpu_millicores.len(),
            pod_cpu: format_cpu(status.pod_cpu_millicores.values().sum()),
        })
        .collect();
    print_table(&rows, format);

    let nodes = &record.snapshot.nodes;
    println!("Nodes: {}/{} ready", nodes.ready, nodes.total);

    let pool = &record.pool.stats;
    println!(
        "Connection pool ({}): active {}/{}, idle {}, waiting {}",
        pool_source_label(pool.source),
        pool.active,
        pool.capacity,
        pool.idle,
        pool.waiting
    );
}

/// Print the headline numbers of a report
pub fn print_summary(summary: &ReportSummary, format: OutputFormat) {
    if let OutputFormat::Json = format {
        if let Ok(json) = serde_json::to_string_pretty(summary) {
            println!("{}", json);
        }
        return;
    }

    println!("\n{}", "Run Summary".bold().underline());
    println!(
        "  Ticks:              {} ({:.1}s at {:.1}s interval)",
        summary.tick_count, summary.duration_secs, summary.interval_secs
    );
    println!("  Pool health:        {}", color_health(summary.health));
    println!(
        "  Pool utilization:   max {:.1}%, avg {:.1}%",
        summary.max_utilization_percent, summary.avg_utilization_percent
    );
    println!(
        "  Waiting threads:    max {} ({} exhaustion ticks)",
        summary.max_waiting, summary.exhaustion_events
    );
    if summary.pool_unavailable_ticks > 0 {
        println!(
            "  {}",
            format!("Pool logs unavailable for {} ticks", summary.pool_unavailable_ticks).yellow()
        );
    }
    println!("  Max ready nodes:    {}", summary.max_ready_nodes);

    for (name, deployment) in &summary.deployments {
        println!(
            "  {}: ready up to {}/{}, autoscaler up to {} replicas at {}% CPU, {} pods seen",
            name.cyan(),
            deployment.max_ready_replicas,
            deployment.max_desired_replicas,
            deployment.max_hpa_replicas,
            deployment.peak_hpa_cpu_percent,
            deployment.distinct_pods
        );
    }
}
