//! Resource conflict detection.
//!
//! An assignee is overloaded when at least three of their unfinished tasks
//! have deadlines clustered within a week of each other.

use super::RiskEngine;
use crate::domain::timestamp::days_between;
use crate::domain::{Task, TaskId};
use crate::report::ResourceConflict;
use std::collections::HashMap;

/// Half-width of the clustering window around each deadline, in days.
pub const CONFLICT_WINDOW_DAYS: u32 = 7;

/// Tasks needed in one window, and in a user's overload set, to report a conflict.
pub const MIN_CONFLICT_TASKS: usize = 3;

impl RiskEngine<'_> {
    /// Detect overloaded assignees, in order of each assignee's first
    /// unfinished task in the snapshot.
    pub fn resource_conflicts(&self) -> Vec<ResourceConflict> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Task>> = HashMap::new();

        for (_, task) in self.graph.tasks() {
            if task.is_done() {
                continue;
            }
            let user = task.assignee_id.as_str();
            groups
                .entry(user)
                .or_insert_with(|| {
                    order.push(user);
                    Vec::new()
                })
                .push(task);
        }

        let mut conflicts = Vec::new();
        for user in order {
            let Some(tasks) = groups.get_mut(user) else {
                continue;
            };
            if tasks.len() < 2 {
                continue;
            }
            tasks.sort_by_key(|task| task.due_date);

            let overloaded = overloaded_tasks(tasks);
            if overloaded.len() < MIN_CONFLICT_TASKS {
                continue;
            }

            tracing::debug!(
                user,
                tasks = overloaded.len(),
                "Assignee has clustered deadlines"
            );
            conflicts.push(ResourceConflict {
                user_id: user.to_string(),
                user_name: tasks.first().and_then(|task| task.assignee_name.clone()),
                task_ids: overloaded,
                overlap_days: CONFLICT_WINDOW_DAYS,
            });
        }
        conflicts
    }
}

/// Union of every week cluster with enough members, in first-insertion order.
///
/// `tasks` must be sorted by deadline. Tasks already in the union do not
/// start a new cluster.
fn overloaded_tasks(tasks: &[&Task]) -> Vec<TaskId> {
    let window = i64::from(CONFLICT_WINDOW_DAYS);
    let mut overloaded: Vec<TaskId> = Vec::new();

    for task in tasks {
        if overloaded.contains(&task.id) {
            continue;
        }

        let cluster: Vec<&TaskId> = tasks
            .iter()
            .filter(|other| days_between(task.due_date, other.due_date).abs() <= window)
            .map(|other| &other.id)
            .collect();

        if cluster.len() >= MIN_CONFLICT_TASKS {
            for id in cluster {
                if !overloaded.contains(id) {
                    overloaded.push(id.clone());
                }
            }
        }
    }
    overloaded
}

#[cfg(test)]
mod tests {
    use crate::domain::{Priority, Task, TaskId, TaskStatus};
    use crate::engine::RiskEngine;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn feb(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap()
    }

    fn task(id: &str, user: &str, due: DateTime<Utc>) -> Task {
        Task {
            id: TaskId::new(id),
            title: id.to_string(),
            description: None,
            status: TaskStatus::InProgress,
            priority: Priority::Medium,
            assignee_id: user.to_string(),
            assignee_name: Some(format!("{user} name")),
            due_date: due,
            created_at: feb(1) - Duration::days(30),
        }
    }

    fn ids(conflict_ids: &[TaskId]) -> Vec<&str> {
        conflict_ids.iter().map(TaskId::as_str).collect()
    }

    #[test]
    fn test_three_tasks_in_one_week_conflict() {
        let tasks = vec![
            task("a", "u1", feb(1)),
            task("b", "u1", feb(3)),
            task("c", "u1", feb(5)),
        ];
        let engine = RiskEngine::new(&tasks, &[], feb(1));

        let conflicts = engine.resource_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].user_id, "u1");
        assert_eq!(conflicts[0].user_name.as_deref(), Some("u1 name"));
        assert_eq!(conflicts[0].overlap_days, 7);
        assert_eq!(ids(&conflicts[0].task_ids), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_two_tasks_are_not_a_conflict() {
        let tasks = vec![task("a", "u1", feb(1)), task("b", "u1", feb(3))];
        let engine = RiskEngine::new(&tasks, &[], feb(1));
        assert!(engine.resource_conflicts().is_empty());
    }

    #[test]
    fn test_done_tasks_are_ignored() {
        let mut done = task("c", "u1", feb(5));
        done.status = TaskStatus::Done;
        let tasks = vec![task("a", "u1", feb(1)), task("b", "u1", feb(3)), done];
        let engine = RiskEngine::new(&tasks, &[], feb(1));
        assert!(engine.resource_conflicts().is_empty());
    }

    #[test]
    fn test_spread_out_deadlines_do_not_conflict() {
        let tasks = vec![
            task("a", "u1", feb(1)),
            task("b", "u1", feb(10)),
            task("c", "u1", feb(20)),
        ];
        let engine = RiskEngine::new(&tasks, &[], feb(1));
        assert!(engine.resource_conflicts().is_empty());
    }

    #[test]
    fn test_window_is_inclusive_at_seven_days() {
        let tasks = vec![
            task("a", "u1", feb(1)),
            task("b", "u1", feb(8)),
            task("c", "u1", feb(9)),
        ];
        let engine = RiskEngine::new(&tasks, &[], feb(1));

        // a's cluster is {a, b}; b's cluster is {a, b, c}
        let conflicts = engine.resource_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(ids(&conflicts[0].task_ids), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_earlier_partial_day_floors_out_of_window() {
        // Seen from b, a is 7 days and 1 hour earlier: floored to -8, outside.
        // Seen from a, b is 7 days ahead but c is 14.
        let gap = Duration::days(7) + Duration::hours(1);
        let tasks = vec![
            task("a", "u1", feb(1)),
            task("b", "u1", feb(1) + gap),
            task("c", "u1", feb(1) + gap + gap),
        ];
        let engine = RiskEngine::new(&tasks, &[], feb(1));
        assert!(engine.resource_conflicts().is_empty());
    }

    #[test]
    fn test_users_reported_once_in_first_appearance_order() {
        let tasks = vec![
            task("x1", "u2", feb(2)),
            task("a", "u1", feb(1)),
            task("x2", "u2", feb(3)),
            task("b", "u1", feb(2)),
            task("x3", "u2", feb(4)),
            task("c", "u1", feb(3)),
            task("x4", "u2", feb(5)),
        ];
        let engine = RiskEngine::new(&tasks, &[], feb(1));

        let conflicts = engine.resource_conflicts();
        let users: Vec<&str> = conflicts.iter().map(|c| c.user_id.as_str()).collect();
        assert_eq!(users, vec!["u2", "u1"]);
        assert_eq!(conflicts[0].task_ids.len(), 4);
    }

    #[test]
    fn test_user_name_comes_from_earliest_deadline() {
        let mut early = task("early", "u1", feb(1));
        early.assignee_name = Some("Ada".to_string());
        let mut later = task("later", "u1", feb(4));
        later.assignee_name = None;
        let tasks = vec![later, task("mid", "u1", feb(2)), early];
        let engine = RiskEngine::new(&tasks, &[], feb(1));

        let conflicts = engine.resource_conflicts();
        assert_eq!(conflicts[0].user_name.as_deref(), Some("Ada"));
        assert_eq!(ids(&conflicts[0].task_ids), vec!["early", "mid", "later"]);
    }
}
