//! Configuration management for the CLI
//!
//! Settings are layered: serde defaults, then an optional TOML file, then
//! `SCALEWATCH_*` environment variables (nested keys use `__`), then
//! command-line flags.

use anyhow::{Context, Result};
use scalewatch_lib::cluster::KubectlRunnerConfig;
use scalewatch_lib::models::MonitoredDeployment;
use scalewatch_lib::pool::{PoolScraperConfig, DEFAULT_EXHAUSTION_MARKER};
use scalewatch_lib::sampler::SamplerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A deployment entry in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Deployment name
    pub name: String,
    /// Autoscaler name (defaults to the deployment name)
    #[serde(default)]
    pub autoscaler: Option<String>,
    /// Pod label selector (defaults to `app=<name>`)
    #[serde(default)]
    pub selector: Option<String>,
}

impl DeploymentConfig {
    pub fn to_monitored(&self) -> MonitoredDeployment {
        let mut deployment = MonitoredDeployment::new(&self.name);
        if let Some(autoscaler) = &self.autoscaler {
            deployment.autoscaler = autoscaler.clone();
        }
        if let Some(selector) = &self.selector {
            deployment.selector = selector.clone();
        }
        deployment
    }
}

/// Connection-pool log scraping settings
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Pods whose logs are scraped (defaults to the first deployment's selector)
    #[serde(default)]
    pub selector: Option<String>,

    /// Phrase marking a pool-exhausted log line
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Concurrent log streams kubectl may open
    #[serde(default = "default_max_log_requests")]
    pub max_log_requests: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            selector: None,
            marker: default_marker(),
            max_log_requests: default_max_log_requests(),
        }
    }
}

/// Scalewatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScalewatchConfig {
    /// kubectl executable
    #[serde(default = "default_kubectl")]
    pub kubectl: PathBuf,

    /// kubeconfig file passed to kubectl
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// kubeconfig context
    #[serde(default)]
    pub context: Option<String>,

    /// Namespace of the monitored deployments
    #[serde(default)]
    pub namespace: Option<String>,

    /// Sampling interval in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: f64,

    /// Extra seconds of logs scanned on top of the interval
    #[serde(default = "default_log_window_slack")]
    pub log_window_slack_secs: f64,

    /// Timeout for a single kubectl call in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: f64,

    /// How long to wait for the sampler to stop in seconds (derived from
    /// the interval and command timeout when unset)
    #[serde(default)]
    pub shutdown_timeout_secs: Option<f64>,

    /// Deployments to monitor
    #[serde(default)]
    pub deployments: Vec<DeploymentConfig>,

    #[serde(default)]
    pub pool: PoolConfig,

    /// Directory receiving one sub-directory per run
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report title
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_kubectl() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_interval() -> f64 {
    5.0
}

fn default_log_window_slack() -> f64 {
    5.0
}

fn default_command_timeout() -> f64 {
    10.0
}

fn default_marker() -> String {
    DEFAULT_EXHAUSTION_MARKER.to_string()
}

fn default_max_log_requests() -> u32 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("scalewatch-results")
}

fn default_title() -> String {
    "Autoscaling load test".to_string()
}

fn secs(value: f64, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid {}: {}", name, value))
}

impl ScalewatchConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// An explicitly given file must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_path(), false),
        };

        let mut builder = config::Config::builder();
        if let Some(path) = &path {
            builder = builder.add_source(config::File::from(path.as_path()).required(required));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("SCALEWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn interval(&self) -> Result<Duration> {
        let interval = secs(self.interval_secs, "interval")?;
        if interval.is_zero() {
            anyhow::bail!("Sampling interval must be greater than zero");
        }
        Ok(interval)
    }

    pub fn log_window_slack(&self) -> Result<Duration> {
        secs(self.log_window_slack_secs, "log window slack")
    }

    pub fn command_timeout(&self) -> Result<Duration> {
        secs(self.command_timeout_secs, "command timeout")
    }

    /// Bounded wait for the sampler to exit once cancelled
    ///
    /// Defaults to one worst-case tick plus the interval sleep, so a healthy
    /// loop never reports a timeout. An explicit value must exceed the interval.
    pub fn shutdown_timeout(&self) -> Result<Duration> {
        let interval = self.interval()?;
        match self.shutdown_timeout_secs {
            Some(value) => {
                let timeout = secs(value, "shutdown timeout")?;
                if timeout <= interval {
                    anyhow::bail!(
                        "Shutdown timeout ({}s) must be longer than the sampling interval ({}s)",
                        value,
                        self.interval_secs
                    );
                }
                Ok(timeout)
            }
            None => {
                let sampler = SamplerConfig {
                    interval,
                    log_window_slack: self.log_window_slack()?,
                    deployments: self.monitored_deployments(),
                };
                Ok(sampler.stop_budget(self.command_timeout()?))
            }
        }
    }

    /// Check every duration setting before any work starts
    pub fn validate(&self) -> Result<()> {
        self.interval()?;
        self.log_window_slack()?;
        self.command_timeout()?;
        self.shutdown_timeout()?;
        Ok(())
    }

    pub fn monitored_deployments(&self) -> Vec<MonitoredDeployment> {
        self.deployments.iter().map(DeploymentConfig::to_monitored).collect()
    }

    pub fn runner_config(&self) -> Result<KubectlRunnerConfig> {
        Ok(KubectlRunnerConfig {
            binary: self.kubectl.clone(),
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            namespace: self.namespace.clone(),
            timeout: self.command_timeout()?,
        })
    }

    /// Pool scraper settings; needs at least one deployment when no selector is set
    pub fn pool_scraper_config(&self) -> Result<PoolScraperConfig> {
        let selector = match &self.pool.selector {
            Some(selector) => selector.clone(),
            None => self
                .monitored_deployments()
                .first()
                .map(|d| d.selector.clone())
                .context("No pool selector configured and no deployments to derive one from")?,
        };

        let mut scraper = PoolScraperConfig::new(selector);
        scraper.marker = self.pool.marker.clone();
        scraper.max_log_requests = self.pool.max_log_requests;
        Ok(scraper)
    }

    /// Replace configured deployments with names given on the command line
    pub fn override_deployments(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.deployments = names
            .iter()
            .map(|name| DeploymentConfig {
                name: name.clone(),
                autoscaler: None,
                selector: None,
            })
            .collect();
    }
}

/// Default configuration file path
fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("scalewatch").join("config.toml"))
}
