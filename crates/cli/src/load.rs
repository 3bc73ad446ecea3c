//! Load generator process management

use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// How the load generator ended
#[derive(Debug)]
pub enum LoadOutcome {
    /// The process exited on its own
    Exited(ExitStatus),
    /// Ctrl-C arrived first; the process was killed
    Interrupted,
}

impl LoadOutcome {
    pub fn success(&self) -> bool {
        matches!(self, LoadOutcome::Exited(status) if status.success())
    }

    pub fn describe(&self) -> String {
        match self {
            LoadOutcome::Exited(status) => match status.code() {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            },
            LoadOutcome::Interrupted => "interrupted".to_string(),
        }
    }
}

/// Run the load generator to completion, inheriting stdout and stderr
pub async fn run_load_generator(command: &[String]) -> Result<LoadOutcome> {
    let (program, args) = command
        .split_first()
        .context("Load generator command is empty")?;

    info!(program = %program, args = ?args, "Starting load generator");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start load generator {}", program))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.context("Failed to wait for load generator")?;
            debug!(status = %status, "Load generator exited");
            Ok(LoadOutcome::Exited(status))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping load generator");
            child.kill().await.context("Failed to kill load generator")?;
            Ok(LoadOutcome::Interrupted)
        }
    }
}
