//! Scalewatch CLI
//!
//! Runs a load generator against a Kubernetes workload while sampling
//! autoscaler, deployment, pod CPU, node and connection-pool state, then
//! renders a self-contained HTML report from the collected timeline.

mod commands;
mod config;
mod load;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{probe, report, run};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Scalewatch CLI
#[derive(Parser)]
#[command(name = "scalewatch")]
#[command(author, version, about = "Observe Kubernetes autoscaling during a load test", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/scalewatch/config.toml)
    #[arg(long, short, env = "SCALEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to kubeconfig file passed to kubectl
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace of the monitored deployments
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample the cluster while a load generator runs, then write a report
    Run {
        /// Deployment to monitor (repeatable, overrides the config file)
        #[arg(long, short)]
        deployment: Vec<String>,

        /// Sampling interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// Directory receiving the run's artifacts
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Report title
        #[arg(long)]
        title: Option<String>,

        /// Load generator command and its arguments
        #[arg(last = true, required = true)]
        load_command: Vec<String>,
    },

    /// Take a single sample and print it
    Probe {
        /// Deployment to probe (repeatable, overrides the config file)
        #[arg(long, short)]
        deployment: Vec<String>,
    },

    /// Render a report from a saved timeline
    Report {
        /// Timeline JSON written by a previous run
        timeline: PathBuf,

        /// Output HTML path (defaults to report.html next to the timeline)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Report title
        #[arg(long)]
        title: Option<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = config::ScalewatchConfig::load(cli.config.as_deref())?;
    if let Some(kubeconfig) = cli.kubeconfig {
        config.kubeconfig = Some(kubeconfig);
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = Some(namespace);
    }

    match cli.command {
        Commands::Run {
            deployment,
            interval,
            output_dir,
            title,
            load_command,
        } => {
            config.override_deployments(&deployment);
            if let Some(interval) = interval {
                config.interval_secs = interval;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if let Some(title) = title {
                config.title = title;
            }
            run::run(&config, &load_command, cli.format).await?;
        }
        Commands::Probe { deployment } => {
            config.override_deployments(&deployment);
            probe::probe(&config, cli.format).await?;
        }
        Commands::Report {
            timeline,
            output,
            title,
        } => {
            let title = title.unwrap_or_else(|| config.title.clone());
            report::report(&timeline, output, &title, cli.format)?;
        }
    }

    Ok(())
}
