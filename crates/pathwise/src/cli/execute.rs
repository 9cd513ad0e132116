//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. JSON output
//! uses the same envelopes as the analysis endpoints of the project service:
//! `{"success": true, ...}` on success and `{"success": false, "error": ...}`
//! on failure.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pathwise_core::{ProjectSnapshot, RiskEngine};
use tokio::io::AsyncReadExt;

use super::args::{InitArgs, SnapshotArgs};
use crate::collab::fallback::MIN_TASKS_FOR_DETECTION;
use crate::error::Error;
use crate::output::{self, OutputConfig, OutputMode};
use crate::service::AnalysisService;

/// Message reported when a snapshot is too small for dependency detection.
pub const TOO_FEW_TASKS_MESSAGE: &str = "Need at least 2 tasks for dependency detection";

/// Read and decode the snapshot named by `args`.
pub async fn load_snapshot(args: &SnapshotArgs) -> crate::error::Result<ProjectSnapshot> {
    let text = if args.is_stdin() {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        tokio::fs::read_to_string(&args.snapshot)
            .await
            .map_err(|source| Error::SnapshotRead {
                path: args.snapshot.clone(),
                source,
            })?
    };

    let snapshot = ProjectSnapshot::from_json(&text)?;
    tracing::debug!(
        project = %snapshot.id,
        tasks = snapshot.tasks.len(),
        "Loaded snapshot"
    );
    Ok(snapshot)
}

/// Print the failure envelope for JSON mode.
pub fn print_failure(error: &anyhow::Error) -> Result<()> {
    output::print_json(&serde_json::json!({
        "success": false,
        "error": format!("{error:#}"),
    }))?;
    Ok(())
}

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.force).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "success": true,
                "configFile": result.config_file.display().to_string(),
                "overwritten": result.overwritten,
            }))?;
        }
        OutputMode::Text => {
            if !args.quiet {
                let config = OutputConfig::from_env();
                let verb = if result.overwritten { "Replaced" } else { "Wrote" };
                println!(
                    "{} {}",
                    output::success(verb, &config),
                    result.config_file.display()
                );
                println!("  Set GROQ_API_KEY or GEMINI_API_KEY to enable dependency detection.");
            }
        }
    }

    Ok(())
}

/// Execute the analyze command
pub async fn execute_analyze(
    service: &AnalysisService,
    args: &SnapshotArgs,
    now: DateTime<Utc>,
    output_mode: OutputMode,
) -> Result<()> {
    let snapshot = load_snapshot(args).await?;
    let analysis = service.analyze(&snapshot, now).await;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "success": true,
                "analysis": analysis,
            }))?;
        }
        OutputMode::Text => output::print_analysis(&analysis, &snapshot)?,
    }

    service.flush_alerts().await;
    Ok(())
}

/// Execute the critical-path command
pub async fn execute_critical_path(
    args: &SnapshotArgs,
    now: DateTime<Utc>,
    output_mode: OutputMode,
) -> Result<()> {
    let snapshot = load_snapshot(args).await?;
    let path = RiskEngine::for_snapshot(&snapshot, now).critical_path();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "success": true,
                "criticalPathIds": path.task_ids,
                "totalDays": path.total_days,
            }))?;
        }
        OutputMode::Text => output::print_critical_path(&path, &snapshot)?,
    }

    Ok(())
}

/// Execute the risk command
pub async fn execute_risk(
    args: &SnapshotArgs,
    now: DateTime<Utc>,
    output_mode: OutputMode,
) -> Result<()> {
    let snapshot = load_snapshot(args).await?;
    let risk = RiskEngine::for_snapshot(&snapshot, now).risk_score();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "success": true,
                "riskScore": risk.score,
                "riskLevel": risk.level,
                "factors": risk.factors,
            }))?;
        }
        OutputMode::Text => output::print_risk(&risk)?,
    }

    Ok(())
}

/// Execute the detect-deps command
pub async fn execute_detect_deps(
    service: &AnalysisService,
    args: &SnapshotArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let snapshot = load_snapshot(args).await?;

    if snapshot.tasks.len() < MIN_TASKS_FOR_DETECTION {
        match output_mode {
            OutputMode::Json => {
                output::print_json(&serde_json::json!({
                    "success": true,
                    "dependencies": [],
                    "error": TOO_FEW_TASKS_MESSAGE,
                }))?;
            }
            OutputMode::Text => {
                let config = OutputConfig::from_env();
                println!("{}", output::warning(TOO_FEW_TASKS_MESSAGE, &config));
            }
        }
        return Ok(());
    }

    let suggestions = service.detect_dependencies(&snapshot).await;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "success": true,
                "dependencies": suggestions,
            }))?;
        }
        OutputMode::Text => output::print_suggestions(&suggestions)?,
    }

    Ok(())
}
