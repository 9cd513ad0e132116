//! Bottlenecks and alerts: human-readable findings derived from the other
//! analyses.

use super::RiskEngine;
use crate::domain::timestamp::days_between;
use crate::domain::TaskStatus;
use crate::report::{Alert, AlertKind, Bottleneck, CriticalPath, ResourceConflict, Severity};

/// Overdue alerts emitted per analysis.
pub const MAX_OVERDUE_ALERTS: usize = 3;

/// Blocked alerts emitted per analysis.
pub const MAX_BLOCKED_ALERTS: usize = 3;

/// Conflict alerts emitted per analysis.
pub const MAX_CONFLICT_ALERTS: usize = 2;

/// Bottlenecks reported per analysis.
pub const MAX_BOTTLENECKS: usize = 5;

/// Days overdue beyond which an overdue alert is high severity.
const HIGH_SEVERITY_OVERDUE_DAYS: i64 = 7;

/// Dependents needed for a critical-path task to count as a bottleneck.
const BOTTLENECK_MIN_DEPENDENTS: usize = 2;

/// Horizon used to estimate the delay impact of an upcoming bottleneck.
const DELAY_HORIZON_DAYS: i64 = 7;

impl RiskEngine<'_> {
    /// Generate alerts, detecting resource conflicts along the way.
    pub fn alerts(&self) -> Vec<Alert> {
        let conflicts = self.resource_conflicts();
        self.alerts_with(&conflicts)
    }

    /// Generate alerts from already-detected resource conflicts.
    ///
    /// Overdue alerts come first, then blocked, then conflicts, each kind
    /// truncated to its own limit.
    pub fn alerts_with(&self, conflicts: &[ResourceConflict]) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for node in self.overdue_tasks().into_iter().take(MAX_OVERDUE_ALERTS) {
            let Some(task) = self.graph.task(node) else {
                continue;
            };
            let days_overdue = days_between(task.due_date, self.now);
            let severity = if days_overdue > HIGH_SEVERITY_OVERDUE_DAYS {
                Severity::High
            } else {
                Severity::Medium
            };
            alerts.push(Alert {
                kind: AlertKind::Overdue,
                severity,
                message: format!("Task '{}' is {days_overdue} days overdue", task.title),
                task_ids: vec![task.id.clone()],
            });
        }

        for node in self.blocked_tasks().into_iter().take(MAX_BLOCKED_ALERTS) {
            let blocker = self
                .first_blocker(node)
                .and_then(|dep| self.graph.task(dep));
            let (Some(task), Some(blocker)) = (self.graph.task(node), blocker) else {
                continue;
            };
            alerts.push(Alert {
                kind: AlertKind::Blocked,
                severity: Severity::Medium,
                message: format!("'{}' is blocked by '{}'", task.title, blocker.title),
                task_ids: vec![task.id.clone(), blocker.id.clone()],
            });
        }

        for conflict in conflicts.iter().take(MAX_CONFLICT_ALERTS) {
            alerts.push(Alert {
                kind: AlertKind::Conflict,
                severity: Severity::Medium,
                message: format!(
                    "Resource overload: {} overlapping tasks",
                    conflict.task_ids.len()
                ),
                task_ids: conflict.task_ids.clone(),
            });
        }

        alerts
    }

    /// Critical-path tasks likely to delay the project, in path order.
    pub fn bottlenecks(&self, critical_path: &CriticalPath) -> Vec<Bottleneck> {
        let mut bottlenecks = Vec::new();

        for id in &critical_path.task_ids {
            if bottlenecks.len() == MAX_BOTTLENECKS {
                break;
            }
            let Some(node) = self.graph.node(id) else {
                continue;
            };
            let Some(task) = self.graph.task(node) else {
                continue;
            };
            if task.is_done() {
                continue;
            }

            let dependents = self.graph.dependents(node).len();
            let many_dependents = dependents >= BOTTLENECK_MIN_DEPENDENTS;
            if !many_dependents && task.status != TaskStatus::Todo {
                continue;
            }

            let days_until_due = days_between(self.now, task.due_date);
            let (reason, delay_impact_days) = if days_until_due < 0 {
                let overdue = days_until_due.abs();
                (
                    format!("Overdue by {overdue} days, blocking {dependents} tasks"),
                    overdue,
                )
            } else if many_dependents {
                (
                    format!("Critical path task blocking {dependents} downstream tasks"),
                    (DELAY_HORIZON_DAYS - days_until_due).max(1),
                )
            } else {
                continue;
            };

            bottlenecks.push(Bottleneck {
                task_id: task.id.clone(),
                task_title: task.title.clone(),
                delay_impact_days,
                reason,
            });
        }

        bottlenecks
    }
}
