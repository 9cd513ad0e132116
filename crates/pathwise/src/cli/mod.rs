//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for pathwise using clap's
//! derive API.
//!
//! # Commands
//!
//! - `analyze`: Full analysis including dependency suggestions and alerts
//! - `critical-path`: Critical path and its length in days
//! - `risk`: Risk score with its factor breakdown
//! - `detect-deps`: Dependency suggestions only
//! - `init`: Write a default `pathwise.yaml`
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config`: Configuration file (default: `./pathwise.yaml` if present)
//! - `--now`: Analysis clock (default: current time)
//! - `--offline`: Do not contact LLM providers or the risk notifier
//!
//! # Example
//!
//! ```bash
//! pathwise analyze project.json
//! pathwise --json --now 2024-01-15 risk project.json
//! cat project.json | pathwise critical-path -
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{InitArgs, SnapshotArgs};
pub use execute::{load_snapshot, TOO_FEW_TASKS_MESSAGE};
pub use validators::validate_now;

use crate::config::PathwiseConfig;
use crate::output::OutputMode;
use crate::service::AnalysisService;

/// Pathwise - project risk analysis
///
/// Computes the critical path, a 0-100 risk score, resource conflicts,
/// bottlenecks and alerts for a project snapshot.
#[derive(Parser, Debug)]
#[command(name = "pathwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Analysis clock (RFC 3339 or YYYY-MM-DD)
    #[arg(long, global = true, value_parser = validate_now)]
    pub now: Option<DateTime<Utc>>,

    /// Skip dependency detection and risk alerts
    #[arg(long, global = true)]
    pub offline: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze a project snapshot
    ///
    /// Runs the full analysis: critical path, risk score, bottlenecks, alerts
    /// and resource conflicts, plus dependency suggestions. Sends a risk
    /// alert when the score is below the configured threshold.
    Analyze(SnapshotArgs),

    /// Show the critical path
    ///
    /// Lists the longest dependency chain and its span in days.
    CriticalPath(SnapshotArgs),

    /// Show the risk score
    ///
    /// Prints the score, its level and the penalty of each factor.
    Risk(SnapshotArgs),

    /// Suggest missing dependencies
    ///
    /// Asks the configured LLM providers for dependencies the snapshot does
    /// not record yet. Needs at least two tasks.
    DetectDeps(SnapshotArgs),

    /// Write a default configuration file
    ///
    /// Creates `pathwise.yaml` in the current directory.
    Init(InitArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Execute the CLI command
    ///
    /// In JSON mode a failure is also reported as a `success: false`
    /// envelope on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, the snapshot or output fails.
    pub async fn execute(&self) -> Result<()> {
        let result = self.dispatch().await;
        if let Err(e) = &result
            && self.json
        {
            execute::print_failure(e)?;
        }
        result
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    async fn service(&self) -> Result<AnalysisService> {
        let config =
            PathwiseConfig::resolve(self.config.as_deref(), &std::env::current_dir()?).await?;
        config.validate()?;
        tracing::debug!(offline = self.offline, "Resolved configuration");
        Ok(AnalysisService::from_config(&config, self.offline))
    }

    async fn dispatch(&self) -> Result<()> {
        let output_mode = self.output_mode();

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Analyze(args)) => {
                let service = self.service().await?;
                execute::execute_analyze(&service, args, self.now(), output_mode).await
            }
            Some(Commands::CriticalPath(args)) => {
                execute::execute_critical_path(args, self.now(), output_mode).await
            }
            Some(Commands::Risk(args)) => {
                execute::execute_risk(args, self.now(), output_mode).await
            }
            Some(Commands::DetectDeps(args)) => {
                let service = self.service().await?;
                execute::execute_detect_deps(&service, args, output_mode).await
            }
            None => {
                println!("Pathwise project risk analysis");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
