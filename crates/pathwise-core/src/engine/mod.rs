//! The deterministic analysis engine.
//!
//! A [`RiskEngine`] borrows one snapshot's tasks and dependencies, builds the
//! [`DependencyGraph`] once, and answers every question about it against a
//! fixed clock. Nothing is cached between runs, so two engines built from the
//! same input and clock produce identical reports.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use pathwise_core::engine::RiskEngine;
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let report = RiskEngine::new(&[], &[], now).run();
//! assert_eq!(report.risk.score, 100);
//! assert!(report.critical_path.task_ids.is_empty());
//! ```

mod conflicts;
mod critical_path;
mod insights;
mod risk;
mod traversal;

pub use conflicts::{CONFLICT_WINDOW_DAYS, MIN_CONFLICT_TASKS};
pub use insights::{MAX_BLOCKED_ALERTS, MAX_BOTTLENECKS, MAX_CONFLICT_ALERTS, MAX_OVERDUE_ALERTS};
pub use risk::{
    AT_RISK_CAP, AT_RISK_PENALTY, AT_RISK_WINDOW_DAYS, BLOCKED_CAP, BLOCKED_PENALTY, CONFLICT_CAP,
    CONFLICT_PENALTY, DEPTH_ALLOWANCE, DEPTH_CAP, DEPTH_PENALTY, MAX_SCORE, OVERDUE_CAP,
    OVERDUE_PENALTY,
};

use crate::domain::{Dependency, ProjectSnapshot, Task};
use crate::graph::DependencyGraph;
use crate::report::EngineReport;
use chrono::{DateTime, Utc};

/// Analysis engine over one snapshot and one clock reading.
#[derive(Debug)]
pub struct RiskEngine<'a> {
    graph: DependencyGraph<'a>,
    now: DateTime<Utc>,
}

impl<'a> RiskEngine<'a> {
    /// Build the engine for a task set and its dependency records.
    pub fn new(tasks: &'a [Task], dependencies: &'a [Dependency], now: DateTime<Utc>) -> Self {
        Self {
            graph: DependencyGraph::build(tasks, dependencies),
            now,
        }
    }

    /// Build the engine for a project snapshot.
    pub fn for_snapshot(snapshot: &'a ProjectSnapshot, now: DateTime<Utc>) -> Self {
        Self::new(&snapshot.tasks, &snapshot.existing_dependencies, now)
    }

    /// The underlying dependency graph.
    pub fn graph(&self) -> &DependencyGraph<'a> {
        &self.graph
    }

    /// The clock reading every time-based rule is evaluated against.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Run every analysis and assemble the report.
    ///
    /// Resource conflicts are detected once and shared by the score and the
    /// alerts.
    pub fn run(&self) -> EngineReport {
        let critical_path = self.critical_path();
        let resource_conflicts = self.resource_conflicts();
        let risk = self.risk_score_with(&resource_conflicts);
        let bottlenecks = self.bottlenecks(&critical_path);
        let alerts = self.alerts_with(&resource_conflicts);

        tracing::info!(
            tasks = self.graph.task_count(),
            score = risk.score,
            level = %risk.level,
            path_len = critical_path.task_ids.len(),
            alerts = alerts.len(),
            "Analysis complete"
        );

        EngineReport {
            critical_path,
            risk,
            bottlenecks,
            alerts,
            resource_conflicts,
        }
    }
}

/// Analyze a snapshot against `now`.
pub fn analyze(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> EngineReport {
    RiskEngine::for_snapshot(snapshot, now).run()
}
