//! Risk scoring.
//!
//! The score starts at 100 and loses points for five independent factors,
//! each with its own per-item penalty and cap. The caps add up to exactly 100.

use super::traversal::resolve_max;
use super::RiskEngine;
use crate::domain::timestamp::days_between;
use crate::domain::TaskStatus;
use crate::report::{FactorBreakdown, ResourceConflict, RiskFactors, RiskLevel, RiskScore};
use petgraph::graph::NodeIndex;

/// Score of a project with no detected risk.
pub const MAX_SCORE: u32 = 100;

/// Penalty per overdue task.
pub const OVERDUE_PENALTY: u32 = 5;
/// Maximum overdue penalty.
pub const OVERDUE_CAP: u32 = 25;

/// Penalty per blocked task.
pub const BLOCKED_PENALTY: u32 = 8;
/// Maximum blocked penalty.
pub const BLOCKED_CAP: u32 = 24;

/// Penalty per resource conflict.
pub const CONFLICT_PENALTY: u32 = 10;
/// Maximum resource conflict penalty.
pub const CONFLICT_CAP: u32 = 20;

/// Chain depth tolerated before penalties apply.
pub const DEPTH_ALLOWANCE: usize = 3;
/// Penalty per level of depth beyond the allowance.
pub const DEPTH_PENALTY: u32 = 2;
/// Maximum depth penalty.
pub const DEPTH_CAP: u32 = 16;

/// Days ahead within which an unstarted task counts as at risk.
pub const AT_RISK_WINDOW_DAYS: i64 = 3;
/// Penalty per at-risk task.
pub const AT_RISK_PENALTY: u32 = 3;
/// Maximum at-risk penalty.
pub const AT_RISK_CAP: u32 = 15;

fn capped(count: usize, per_item: u32, cap: u32) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(per_item)
        .min(cap)
}

impl RiskEngine<'_> {
    /// Unfinished tasks whose deadline is strictly before now, in snapshot order.
    pub fn overdue_tasks(&self) -> Vec<NodeIndex> {
        self.graph
            .tasks()
            .filter(|(_, task)| !task.is_done() && task.due_date < self.now)
            .map(|(node, _)| node)
            .collect()
    }

    /// Unfinished tasks with at least one unfinished dependency that exists in
    /// the snapshot, in order of first appearance as a dependent.
    pub fn blocked_tasks(&self) -> Vec<NodeIndex> {
        self.graph
            .dependent_order()
            .iter()
            .copied()
            .filter(|&node| {
                self.graph.task(node).is_some_and(|task| !task.is_done())
                    && self.first_blocker(node).is_some()
            })
            .collect()
    }

    /// The first unfinished, existing dependency of `node`.
    pub fn first_blocker(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph.existing_dependencies(node).find(|&dep| {
            self.graph
                .task(dep)
                .is_some_and(|blocker| !blocker.is_done())
        })
    }

    /// Unstarted tasks due between now and three days from now, inclusive.
    pub fn at_risk_tasks(&self) -> Vec<NodeIndex> {
        self.graph
            .tasks()
            .filter(|(_, task)| {
                task.status == TaskStatus::Todo
                    && (0..=AT_RISK_WINDOW_DAYS).contains(&days_between(self.now, task.due_date))
            })
            .map(|(node, _)| node)
            .collect()
    }

    /// Longest dependency chain, counted in edges.
    ///
    /// A task with no dependencies has depth 0; otherwise its depth is one
    /// more than the deepest existing dependency. A dependency already on the
    /// current path contributes 0.
    pub fn max_chain_depth(&self) -> usize {
        if !self.graph.has_dependencies() {
            return 0;
        }

        let depths = resolve_max(
            &self.graph,
            |node, _| usize::from(!self.graph.depends_on(node).is_empty()),
            |depth| depth + 1,
            |_, _| 0,
        );
        depths.into_iter().max().unwrap_or(0)
    }

    /// Compute the risk score, detecting resource conflicts along the way.
    pub fn risk_score(&self) -> RiskScore {
        let conflicts = self.resource_conflicts();
        self.risk_score_with(&conflicts)
    }

    /// Compute the risk score from already-detected resource conflicts.
    pub fn risk_score_with(&self, conflicts: &[ResourceConflict]) -> RiskScore {
        let overdue = self.overdue_tasks();
        let blocked = self.blocked_tasks();
        let at_risk = self.at_risk_tasks();
        let depth = self.max_chain_depth();

        let factors = RiskFactors {
            overdue: self.task_factor(&overdue, OVERDUE_PENALTY, OVERDUE_CAP),
            blocked: self.task_factor(&blocked, BLOCKED_PENALTY, BLOCKED_CAP),
            resource_conflicts: FactorBreakdown {
                count: conflicts.len(),
                penalty: capped(conflicts.len(), CONFLICT_PENALTY, CONFLICT_CAP),
                task_ids: None,
            },
            dependency_depth: FactorBreakdown {
                count: depth,
                penalty: capped(
                    depth.saturating_sub(DEPTH_ALLOWANCE),
                    DEPTH_PENALTY,
                    DEPTH_CAP,
                ),
                task_ids: None,
            },
            at_risk: self.task_factor(&at_risk, AT_RISK_PENALTY, AT_RISK_CAP),
        };

        let score = MAX_SCORE.saturating_sub(factors.total_penalty()).min(MAX_SCORE);
        let score = u8::try_from(score).unwrap_or(0);

        tracing::debug!(
            score,
            overdue = overdue.len(),
            blocked = blocked.len(),
            conflicts = conflicts.len(),
            depth,
            at_risk = at_risk.len(),
            "Scored project risk"
        );

        RiskScore {
            score,
            level: RiskLevel::from_score(score),
            factors,
        }
    }

    fn task_factor(&self, nodes: &[NodeIndex], per_item: u32, cap: u32) -> FactorBreakdown {
        FactorBreakdown {
            count: nodes.len(),
            penalty: capped(nodes.len(), per_item, cap),
            task_ids: Some(
                nodes
                    .iter()
                    .map(|&node| self.graph.id(node).clone())
                    .collect(),
            ),
        }
    }
}
