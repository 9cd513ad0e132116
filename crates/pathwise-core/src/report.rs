//! Analysis output types.
//!
//! Everything here is derived from one snapshot and immutable once produced.
//! JSON field names follow the wire contract consumed by project-management
//! front ends (camelCase, lowercase enum values).

use crate::domain::{DependencyType, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative risk level derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score 80-100
    Low,

    /// Score 60-79
    Medium,

    /// Score 40-59
    High,

    /// Score below 40
    Critical,
}

impl RiskLevel {
    /// Map a score to its level.
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Low,
            60..=79 => Self::Medium,
            40..=59 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The critical path of a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    /// Task IDs from start to end
    #[serde(rename = "criticalPathIds")]
    pub task_ids: Vec<TaskId>,

    /// Days from the first task's creation to the last task's deadline
    pub total_days: u32,
}

/// Contribution of one factor to the risk score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorBreakdown {
    /// Number of qualifying items (tasks, conflicts, or chain depth)
    pub count: usize,

    /// Points subtracted from the score, already capped
    pub penalty: u32,

    /// Qualifying tasks, for task-based factors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<TaskId>>,
}

/// Itemized risk factors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Unfinished tasks past their deadline
    pub overdue: FactorBreakdown,

    /// Unfinished tasks waiting on unfinished dependencies
    pub blocked: FactorBreakdown,

    /// Overloaded assignees
    pub resource_conflicts: FactorBreakdown,

    /// Longest dependency chain; `count` holds the depth
    pub dependency_depth: FactorBreakdown,

    /// Unstarted tasks due within three days
    pub at_risk: FactorBreakdown,
}

impl RiskFactors {
    /// Sum of all penalties.
    pub fn total_penalty(&self) -> u32 {
        self.overdue.penalty
            + self.blocked.penalty
            + self.resource_conflicts.penalty
            + self.dependency_depth.penalty
            + self.at_risk.penalty
    }
}

/// Risk score with its level and breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    /// Health score, 100 = no risk detected
    #[serde(rename = "riskScore")]
    pub score: u8,

    /// Qualitative level for `score`
    #[serde(rename = "riskLevel")]
    pub level: RiskLevel,

    /// Contributing factors
    pub factors: RiskFactors,
}

/// A critical-path task threatening project completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    /// The bottleneck task
    pub task_id: TaskId,

    /// Its title
    pub task_title: String,

    /// Estimated days of delay it causes
    pub delay_impact_days: i64,

    /// Human-readable explanation
    pub reason: String,
}

/// Kind of alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A task is past its deadline
    Overdue,

    /// A task waits on an unfinished dependency
    Blocked,

    /// An assignee is overloaded
    Conflict,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::Blocked => write!(f, "blocked"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Low,

    /// Needs attention
    Medium,

    /// Needs attention soon
    High,

    /// Needs attention now
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A human-readable finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Alert kind
    #[serde(rename = "type")]
    pub kind: AlertKind,

    /// Alert severity
    pub severity: Severity,

    /// Message naming the tasks involved
    pub message: String,

    /// Tasks involved
    pub task_ids: Vec<TaskId>,
}

/// An assignee with too many deadlines in one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConflict {
    /// The overloaded assignee
    pub user_id: String,

    /// Their display name, when known
    pub user_name: Option<String>,

    /// Tasks in the overloaded window
    pub task_ids: Vec<TaskId>,

    /// Width of the clustering window in days
    pub overlap_days: u32,
}

/// A dependency proposed by a dependency detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedDependency {
    /// The task that should depend on another
    pub task_id: TaskId,

    /// The task it should depend on
    pub depends_on_task_id: TaskId,

    /// Dependency type
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,

    /// Detector confidence in `[0, 1]`
    pub confidence: f64,

    /// Why the dependency was proposed
    pub reason: String,
}

/// The deterministic part of an analysis: everything computable from the
/// snapshot and a fixed clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReport {
    /// Critical path and its length
    #[serde(flatten)]
    pub critical_path: CriticalPath,

    /// Risk score, level and factors
    #[serde(flatten)]
    pub risk: RiskScore,

    /// Bottlenecks on the critical path
    pub bottlenecks: Vec<Bottleneck>,

    /// Alerts, overdue first, then blocked, then conflicts
    pub alerts: Vec<Alert>,

    /// Overloaded assignees
    pub resource_conflicts: Vec<ResourceConflict>,
}

/// Complete analysis of one project snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    /// Project the analysis belongs to
    pub project_id: String,

    /// Deterministic findings
    #[serde(flatten)]
    pub report: EngineReport,

    /// Dependencies proposed by the dependency detector
    pub suggested_dependencies: Vec<SuggestedDependency>,

    /// Clock used for the analysis
    pub analyzed_at: DateTime<Utc>,
}

impl RiskAnalysis {
    /// Combine an engine report with detector suggestions.
    pub fn new(
        project_id: impl Into<String>,
        report: EngineReport,
        suggested_dependencies: Vec<SuggestedDependency>,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            report,
            suggested_dependencies,
            analyzed_at,
        }
    }

    /// The risk score.
    pub fn risk_score(&self) -> u8 {
        self.report.risk.score
    }

    /// The risk level.
    pub fn risk_level(&self) -> RiskLevel {
        self.report.risk.level
    }
}
