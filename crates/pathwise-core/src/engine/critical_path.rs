//! Critical path approximation.
//!
//! Tasks carry no duration estimates, so due dates stand in for finish times:
//! a task's earliest finish is the later of its own deadline and the earliest
//! finish of everything it depends on. The critical path is traced backward
//! from the task that finishes last.

use super::traversal::resolve_max;
use super::RiskEngine;
use crate::domain::timestamp::days_between;
use crate::domain::{Task, TaskId};
use crate::report::CriticalPath;
use chrono::{DateTime, Utc};
use petgraph::graph::NodeIndex;

impl RiskEngine<'_> {
    /// Earliest finish per snapshot task, indexed by node.
    ///
    /// A dependency found on the current traversal path contributes its
    /// memoized value if one exists, otherwise its own due date.
    pub fn earliest_finish(&self) -> Vec<DateTime<Utc>> {
        resolve_max(
            &self.graph,
            |_, task| task.due_date,
            |finish| finish,
            |node, memo| {
                memo.or_else(|| self.graph.task(node).map(|task| task.due_date))
                    .unwrap_or(self.now)
            },
        )
    }

    /// Tasks with no outgoing depends-on edges, or the earliest-due task when
    /// every task depends on something.
    pub fn start_candidates(&self) -> Vec<&TaskId> {
        let starts: Vec<&TaskId> = self
            .graph
            .tasks()
            .filter(|(node, _)| self.graph.depends_on(*node).is_empty())
            .map(|(_, task)| &task.id)
            .collect();

        if !starts.is_empty() {
            return starts;
        }

        let mut earliest: Option<&Task> = None;
        for (_, task) in self.graph.tasks() {
            if earliest.is_none_or(|best| task.due_date < best.due_date) {
                earliest = Some(task);
            }
        }
        earliest.map(|task| vec![&task.id]).unwrap_or_default()
    }

    /// Compute the critical path and its length in days.
    ///
    /// Ties are broken by position: the end task is the first maximal task in
    /// snapshot order, and each backward step takes the first maximal
    /// dependency in dependency-list order. The trace stops at a task without
    /// existing dependencies or when it would revisit a task.
    pub fn critical_path(&self) -> CriticalPath {
        if self.graph.is_empty() {
            return CriticalPath::default();
        }

        let starts = self.start_candidates();
        tracing::debug!(start_candidates = starts.len(), "Computing critical path");

        let finish = self.earliest_finish();

        let mut end = NodeIndex::new(0);
        for (node, _) in self.graph.tasks().skip(1) {
            if finish[node.index()] > finish[end.index()] {
                end = node;
            }
        }

        let mut visited = vec![false; finish.len()];
        let mut trace = Vec::new();
        let mut current = Some(end);

        while let Some(node) = current {
            if visited[node.index()] {
                break;
            }
            visited[node.index()] = true;
            trace.push(node);

            let mut next: Option<NodeIndex> = None;
            for dep in self.graph.existing_dependencies(node) {
                if next.is_none_or(|best| finish[dep.index()] > finish[best.index()]) {
                    next = Some(dep);
                }
            }
            current = next;
        }

        trace.reverse();

        let total_days = match (trace.first(), trace.last()) {
            (Some(&first), Some(&last)) => match (self.graph.task(first), self.graph.task(last)) {
                (Some(first), Some(last)) => {
                    let days = days_between(first.created_at, last.due_date).max(0);
                    u32::try_from(days).unwrap_or(u32::MAX)
                }
                _ => 0,
            },
            _ => 0,
        };

        CriticalPath {
            task_ids: trace.iter().map(|&node| self.graph.id(node).clone()).collect(),
            total_days,
        }
    }
}
