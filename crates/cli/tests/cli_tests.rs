//! CLI integration tests

use std::process::Command;

fn scalewatch() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_scalewatch"));
    command.env_remove("SCALEWATCH_CONFIG").env("HOME", std::env::temp_dir());
    command
}

const TIMELINE: &str = r#"{
  "interval_secs": 5.0,
  "ticks": [
    {
      "snapshot": {
        "elapsed_seconds": 0.0,
        "captured_at": "2024-05-01T10:00:00Z",
        "nodes": {"total": 3, "ready": 3},
        "deployments": {
          "web": {
            "desired_replicas": 2,
            "ready_replicas": 2,
            "hpa_replicas": 2,
            "hpa_cpu_percent": 40,
            "pod_cpu_millicores": {"web-a": 120, "web-b": 300}
          }
        }
      },
      "pool": {"elapsed_seconds": 0.0, "capacity": 10, "active": 3, "idle": 7, "waiting": 0, "source": "observed"}
    },
    {
      "snapshot": {
        "elapsed_seconds": 5.0,
        "captured_at": "2024-05-01T10:00:05Z",
        "nodes": {"total": 3, "ready": 3},
        "deployments": {
          "web": {
            "desired_replicas": 4,
            "ready_replicas": 3,
            "hpa_replicas": 4,
            "hpa_cpu_percent": 95,
            "pod_cpu_millicores": {"web-b": 310, "web-c": 90}
          }
        }
      },
      "pool": {"elapsed_seconds": 5.0, "capacity": 10, "active": 10, "idle": 0, "waiting": 4, "source": "observed"}
    }
  ]
}"#;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = scalewatch()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("autoscaling"), "Should describe the tool");
    assert!(stdout.contains("run"), "Should show run command");
    assert!(stdout.contains("probe"), "Should show probe command");
    assert!(stdout.contains("report"), "Should show report command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = scalewatch()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("scalewatch"), "Should show binary name");
}

/// Test run subcommand help
#[test]
fn test_run_help() {
    let output = scalewatch()
        .args(["run", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Run help should succeed");
    assert!(stdout.contains("--deployment"), "Should show deployment option");
    assert!(stdout.contains("--interval"), "Should show interval option");
    assert!(stdout.contains("LOAD_COMMAND"), "Should show load command");
}

/// Test that run requires a load generator command
#[test]
fn test_run_requires_load_command() {
    let output = scalewatch()
        .args(["run", "--deployment", "web"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Run without a load command should fail");
}

/// Test that probe fails cleanly without deployments
#[test]
fn test_probe_without_deployments() {
    let output = scalewatch()
        .arg("probe")
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Probe without deployments should fail");
    assert!(stderr.contains("No deployments configured"));
}

/// Test rendering a report from a saved timeline
#[test]
fn test_report_from_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let timeline = dir.path().join("timeline.json");
    std::fs::write(&timeline, TIMELINE).unwrap();

    let output = scalewatch()
        .args(["--format", "json", "report"])
        .arg(&timeline)
        .args(["--title", "Checkout soak"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Report should succeed: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["tick_count"], 2);
    assert_eq!(summary["max_waiting"], 4);
    assert_eq!(summary["health"], "exhausted");

    let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
    assert!(html.contains("Checkout soak"));
    assert!(html.contains("<svg"));
}

/// Run against a cluster whose kubectl cannot be started
fn run_unreachable(output_dir: &std::path::Path, load: &[&str]) -> std::process::Output {
    scalewatch()
        .env("SCALEWATCH_KUBECTL", "/nonexistent/kubectl")
        .args(["--format", "json", "run", "--deployment", "web", "--interval", "0.2"])
        .arg("--output-dir")
        .arg(output_dir)
        .arg("--")
        .args(load)
        .output()
        .expect("Failed to execute command")
}

fn single_run_dir(output_dir: &std::path::Path) -> std::path::PathBuf {
    let dirs: Vec<_> = std::fs::read_dir(output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(dirs.len(), 1, "Expected one run directory");
    dirs[0].clone()
}

/// Test that an unreachable cluster still produces every artifact
#[test]
fn test_run_with_unreachable_cluster_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_unreachable(dir.path(), &["sleep", "1"]);
    assert!(output.status.success(), "Run should succeed: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(summary["tick_count"].as_u64().unwrap() >= 1);
    assert_eq!(summary["health"], "healthy");

    let run_dir = single_run_dir(dir.path());
    assert!(run_dir.join("report.html").is_file());
    assert!(run_dir.join("sampler_metrics.prom").is_file());

    let timeline: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("timeline.json")).unwrap()).unwrap();
    let ticks = timeline["ticks"].as_array().unwrap();
    assert!(!ticks.is_empty());
    for tick in ticks {
        let web = &tick["snapshot"]["deployments"]["web"];
        assert_eq!(web["desired_replicas"], 0);
        assert_eq!(web["ready_replicas"], 0);
        assert_eq!(web["hpa_replicas"], 0);
        assert!(web["pod_cpu_millicores"].as_object().unwrap().is_empty());
        assert_eq!(tick["pool"]["source"], "unavailable");
    }

    let metrics = std::fs::read_to_string(run_dir.join("sampler_metrics.prom")).unwrap();
    assert!(metrics.contains("scalewatch_ticks_total"));
}

/// Test that a failing load generator keeps JSON output clean and still reports
#[test]
fn test_run_with_failing_load_keeps_json_stdout() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_unreachable(dir.path(), &["false"]);
    assert!(output.status.success(), "A failed load generator is not fatal");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)
        .expect("stdout should hold only the summary JSON");
    assert!(summary["tick_count"].is_u64());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Load generator exited with code 1"));

    let run_dir = single_run_dir(dir.path());
    assert!(run_dir.join("report.html").is_file());
    assert!(run_dir.join("timeline.json").is_file());
}

/// Test that a shutdown timeout not longer than the interval is rejected up front
#[test]
fn test_run_rejects_short_shutdown_timeout() {
    let dir = tempfile::tempdir().unwrap();

    let output = scalewatch()
        .env("SCALEWATCH_KUBECTL", "/nonexistent/kubectl")
        .env("SCALEWATCH_SHUTDOWN_TIMEOUT_SECS", "1")
        .args(["run", "--deployment", "web", "--interval", "2"])
        .arg("--output-dir")
        .arg(dir.path())
        .args(["--", "true"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Shutdown timeout"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// Test that a missing timeline is reported as an error
#[test]
fn test_report_missing_timeline() {
    let output = scalewatch()
        .args(["report", "/nonexistent/timeline.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Missing timeline should fail");
}
