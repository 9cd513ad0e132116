//! Property tests for score bounds and factor caps over arbitrary snapshots.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pathwise_core::engine::{
    RiskEngine, AT_RISK_CAP, BLOCKED_CAP, CONFLICT_CAP, DEPTH_CAP, OVERDUE_CAP,
};
use pathwise_core::{Dependency, Priority, RiskLevel, Task, TaskId, TaskStatus};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

/// (status, assignee index, due offset in hours)
fn task_strategy() -> impl Strategy<Value = (TaskStatus, u8, i64)> {
    (status_strategy(), 0u8..4, -720i64..720)
}

fn build_tasks(specs: &[(TaskStatus, u8, i64)]) -> Vec<Task> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(status, user, hours))| Task {
            id: TaskId::new(format!("t{i}")),
            title: format!("Task {i}"),
            description: None,
            status,
            priority: Priority::Low,
            assignee_id: format!("u{user}"),
            assignee_name: None,
            due_date: now() + Duration::hours(hours),
            created_at: now() - Duration::days(10),
        })
        .collect()
}

/// Edges between arbitrary indices; indices past the task list become
/// dangling references.
fn build_deps(edges: &[(usize, usize)]) -> Vec<Dependency> {
    edges
        .iter()
        .enumerate()
        .map(|(i, &(from, to))| Dependency::new(format!("d{i}"), format!("t{from}"), format!("t{to}")))
        .collect()
}

proptest! {
    #[test]
    fn score_is_bounded_and_matches_level(
        specs in prop::collection::vec(task_strategy(), 0..40),
        edges in prop::collection::vec((0usize..45, 0usize..45), 0..60),
    ) {
        let tasks = build_tasks(&specs);
        let deps = build_deps(&edges);
        let report = RiskEngine::new(&tasks, &deps, now()).run();

        prop_assert!(report.risk.score <= 100);
        prop_assert_eq!(report.risk.level, RiskLevel::from_score(report.risk.score));
        prop_assert_eq!(
            u32::from(report.risk.score),
            100u32.saturating_sub(report.risk.factors.total_penalty())
        );
    }

    #[test]
    fn factor_penalties_never_exceed_caps(
        specs in prop::collection::vec(task_strategy(), 0..60),
        edges in prop::collection::vec((0usize..60, 0usize..60), 0..120),
    ) {
        let tasks = build_tasks(&specs);
        let deps = build_deps(&edges);
        let factors = RiskEngine::new(&tasks, &deps, now()).risk_score().factors;

        prop_assert!(factors.overdue.penalty <= OVERDUE_CAP);
        prop_assert!(factors.blocked.penalty <= BLOCKED_CAP);
        prop_assert!(factors.resource_conflicts.penalty <= CONFLICT_CAP);
        prop_assert!(factors.dependency_depth.penalty <= DEPTH_CAP);
        prop_assert!(factors.at_risk.penalty <= AT_RISK_CAP);
    }

    #[test]
    fn critical_path_has_no_repeats_and_only_known_tasks(
        specs in prop::collection::vec(task_strategy(), 1..30),
        edges in prop::collection::vec((0usize..35, 0usize..35), 0..50),
    ) {
        let tasks = build_tasks(&specs);
        let deps = build_deps(&edges);
        let path = RiskEngine::new(&tasks, &deps, now()).critical_path();

        prop_assert!(!path.task_ids.is_empty());
        let mut seen = std::collections::HashSet::new();
        for id in &path.task_ids {
            prop_assert!(tasks.iter().any(|task| &task.id == id));
            prop_assert!(seen.insert(id.clone()));
        }
    }
}
