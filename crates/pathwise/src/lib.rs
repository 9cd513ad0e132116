//! Pathwise - project risk analysis service and CLI.
//!
//! Wraps the deterministic engine in [`pathwise_core`] with everything an
//! analysis run needs around it: configuration, LLM-backed dependency
//! detection, risk-alert notification and terminal output.
//!
//! ```no_run
//! use pathwise::config::PathwiseConfig;
//! use pathwise::service::AnalysisService;
//! use pathwise_core::ProjectSnapshot;
//!
//! # async fn run(snapshot: ProjectSnapshot) -> pathwise::error::Result<()> {
//! let config = PathwiseConfig::resolve(None, &std::env::current_dir()?).await?;
//! let service = AnalysisService::from_config(&config, false);
//! let analysis = service.analyze(&snapshot, chrono::Utc::now()).await;
//! println!("{} ({})", analysis.risk_score(), analysis.risk_level());
//! service.flush_alerts().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod collab;
pub mod config;
pub mod error;
pub mod service;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

pub mod output;

pub use error::{Error, Result};
pub use service::AnalysisService;
