//! Pathwise core - deterministic risk analysis for project task graphs.
//!
//! Given a [`ProjectSnapshot`](domain::ProjectSnapshot) and a clock reading,
//! the engine computes the critical path, a 0-100 risk score with itemized
//! factors, resource conflicts, bottlenecks and alerts. It performs no I/O and
//! never fails: dangling references are skipped and dependency cycles are
//! truncated.

#![forbid(unsafe_code)]

pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod report;

pub use domain::{Dependency, DependencyType, Priority, ProjectSnapshot, Task, TaskId, TaskStatus};
pub use engine::{analyze, RiskEngine};
pub use error::{Error, Result};
pub use report::{
    Alert, AlertKind, Bottleneck, CriticalPath, EngineReport, FactorBreakdown, ResourceConflict,
    RiskAnalysis, RiskFactors, RiskLevel, RiskScore, Severity, SuggestedDependency,
};
