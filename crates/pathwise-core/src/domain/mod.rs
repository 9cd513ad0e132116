//! Domain types for project snapshots.
//!
//! A [`ProjectSnapshot`] is the single input of an analysis run: the task set
//! and the dependency edges between tasks, exactly as the caller holds them.
//! The engine never mutates these records.

pub mod timestamp;

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new task ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A task in a project snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Task description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Priority level
    pub priority: Priority,

    /// ID of the assigned user
    pub assignee_id: String,

    /// Display name of the assigned user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,

    /// Deadline
    #[serde(alias = "due_date", deserialize_with = "timestamp::deserialize")]
    pub due_date: DateTime<Utc>,

    /// Creation timestamp
    #[serde(alias = "created_at", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task has been completed
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Currently being worked on
    InProgress,

    /// Completed
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Todo => write!(f, "TODO"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Low priority
    Low,

    /// Medium priority
    Medium,

    /// High priority
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A directed dependency edge: `task_id` depends on `depends_on_task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Identifier of the dependency record
    #[serde(default)]
    pub id: String,

    /// The dependent task
    pub task_id: TaskId,

    /// The task it depends on
    pub depends_on_task_id: TaskId,

    /// Type of dependency (informational only)
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,
}

impl Dependency {
    /// Create a finish-to-start dependency
    pub fn new(
        id: impl Into<String>,
        task_id: impl Into<TaskId>,
        depends_on_task_id: impl Into<TaskId>,
    ) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            depends_on_task_id: depends_on_task_id.into(),
            dep_type: DependencyType::default(),
        }
    }

    /// The `"<taskId>-><dependsOnTaskId>"` form used when describing existing
    /// edges to a dependency detector.
    pub fn pair_key(&self) -> String {
        format!("{}->{}", self.task_id, self.depends_on_task_id)
    }
}

/// Type of dependency relationship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyType {
    /// Successor starts after the predecessor finishes
    #[default]
    FinishToStart,

    /// Successor starts when the predecessor starts
    StartToStart,

    /// Successor finishes when the predecessor finishes
    FinishToFinish,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FinishToStart => write!(f, "FINISH_TO_START"),
            Self::StartToStart => write!(f, "START_TO_START"),
            Self::FinishToFinish => write!(f, "FINISH_TO_FINISH"),
        }
    }
}

/// Immutable snapshot of a project handed to one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    /// Project identifier
    pub id: String,

    /// Project name
    pub name: String,

    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Planned start
    #[serde(
        default,
        alias = "start_date",
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,

    /// Planned end
    #[serde(
        default,
        alias = "end_date",
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,

    /// Tasks in the project
    pub tasks: Vec<Task>,

    /// Dependency edges between tasks
    #[serde(default)]
    pub existing_dependencies: Vec<Dependency>,
}

/// On-disk snapshot documents are either the bare project or the
/// `{ "project": ... }` request envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Wrapped { project: ProjectSnapshot },
    Bare(ProjectSnapshot),
}

impl ProjectSnapshot {
    /// Decode a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Snapshot` if the text is not a valid snapshot document.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SnapshotDocument = serde_json::from_str(json)?;
        Ok(doc.into_project())
    }

    /// The existing edges as `"<taskId>-><dependsOnTaskId>"` strings.
    pub fn dependency_pairs(&self) -> Vec<String> {
        self.existing_dependencies
            .iter()
            .map(Dependency::pair_key)
            .collect()
    }
}

impl SnapshotDocument {
    fn into_project(self) -> ProjectSnapshot {
        match self {
            Self::Wrapped { project } | Self::Bare(project) => project,
        }
    }
}
