//! kubectl process execution
//!
//! Wraps `tokio::process` so that spawn failures, non-zero exits and
//! hung invocations all surface as [`CollectorError`] values.

use crate::error::CollectorError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default timeout for a single kubectl invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes orchestrator client commands and returns their stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<String, CollectorError>;
}

/// Connection settings for the kubectl binary
#[derive(Debug, Clone)]
pub struct KubectlRunnerConfig {
    /// Path or name of the kubectl executable
    pub binary: PathBuf,
    /// Explicit kubeconfig file (kubectl default when unset)
    pub kubeconfig: Option<PathBuf>,
    /// kubeconfig context to use
    pub context: Option<String>,
    /// Namespace for namespaced resources
    pub namespace: Option<String>,
    /// Upper bound on a single invocation
    pub timeout: Duration,
}

impl Default for KubectlRunnerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
            kubeconfig: None,
            context: None,
            namespace: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Runs kubectl as a child process
pub struct KubectlRunner {
    config: KubectlRunnerConfig,
}

impl KubectlRunner {
    pub fn new(config: KubectlRunnerConfig) -> Self {
        Self { config }
    }

    /// Full argument list including connection flags
    fn full_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 6);
        if let Some(kubeconfig) = &self.config.kubeconfig {
            full.push("--kubeconfig".to_string());
            full.push(kubeconfig.display().to_string());
        }
        if let Some(context) = &self.config.context {
            full.push("--context".to_string());
            full.push(context.clone());
        }
        if let Some(namespace) = &self.config.namespace {
            full.push("-n".to_string());
            full.push(namespace.clone());
        }
        full.extend(args.iter().cloned());
        full
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.config.binary.display(), args.join(" "))
    }
}

#[async_trait]
impl CommandRunner for KubectlRunner {
    async fn run(&self, args: &[String]) -> Result<String, CollectorError> {
        let command = self.describe(args);
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(self.full_args(args))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %command, "Running orchestrator query");

        let output = match tokio::time::timeout(self.config.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CollectorError::Unavailable {
                    command,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CollectorError::Timeout {
                    command,
                    timeout_ms: self.config.timeout.as_millis() as u64,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("exit status {}", output.status));
            return Err(CollectorError::Unavailable { command, reason });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
