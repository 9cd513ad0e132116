//! Dependency graph construction using petgraph.
//!
//! Node indices double as an arena for the traversals in the engine:
//! snapshot tasks occupy indices `0..task_count` in snapshot order, and ids
//! that only appear in dependency records (dangling references) are appended
//! after them. Traversals can therefore keep per-node state in plain vectors
//! and test "is this a real task" with an index comparison.
//!
//! # Edge Direction Reminder
//!
//! Edges point from **dependent -> dependency** (source depends on target).

use crate::domain::{Dependency, DependencyType, Task, TaskId};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Forward and reverse adjacency for one snapshot.
///
/// Adjacency lists keep dependency-list order and preserve duplicate edges;
/// petgraph's own edge iteration runs newest-first, so the ordered lists are
/// recorded separately while the graph is built.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    graph: DiGraph<&'a TaskId, DependencyType>,
    node_map: HashMap<&'a TaskId, NodeIndex>,
    tasks: Vec<&'a Task>,
    depends_on: Vec<Vec<NodeIndex>>,
    dependents: Vec<Vec<NodeIndex>>,
    dependent_order: Vec<NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph for a task set and its dependency records.
    ///
    /// Duplicate task ids keep the position of their first occurrence and
    /// the contents of their last. Dependencies referencing unknown ids are
    /// kept as edges to dangling nodes; nothing is validated.
    pub fn build(tasks: &'a [Task], dependencies: &'a [Dependency]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<&'a TaskId, NodeIndex> = HashMap::new();
        let mut ordered: Vec<&'a Task> = Vec::with_capacity(tasks.len());

        for task in tasks {
            if let Some(&node) = node_map.get(&task.id) {
                ordered[node.index()] = task;
            } else {
                let node = graph.add_node(&task.id);
                node_map.insert(&task.id, node);
                ordered.push(task);
            }
        }

        let mut depends_on: Vec<Vec<NodeIndex>> = vec![Vec::new(); graph.node_count()];
        let mut dependents: Vec<Vec<NodeIndex>> = vec![Vec::new(); graph.node_count()];
        let mut dependent_order = Vec::new();

        for dep in dependencies {
            let from = Self::intern(&mut graph, &mut node_map, &dep.task_id);
            let to = Self::intern(&mut graph, &mut node_map, &dep.depends_on_task_id);

            let needed = graph.node_count();
            if depends_on.len() < needed {
                depends_on.resize_with(needed, Vec::new);
                dependents.resize_with(needed, Vec::new);
            }

            if depends_on[from.index()].is_empty() {
                dependent_order.push(from);
            }
            depends_on[from.index()].push(to);
            dependents[to.index()].push(from);
            graph.add_edge(from, to, dep.dep_type);
        }

        let dangling = graph.node_count() - ordered.len();
        if dangling > 0 {
            tracing::debug!(dangling, "Dependencies reference tasks outside the snapshot");
        }
        if algo::is_cyclic_directed(&graph) {
            tracing::warn!(
                edges = graph.edge_count(),
                "Dependency cycle detected; traversals will truncate it"
            );
        }

        Self {
            graph,
            node_map,
            tasks: ordered,
            depends_on,
            dependents,
            dependent_order,
        }
    }

    fn intern(
        graph: &mut DiGraph<&'a TaskId, DependencyType>,
        node_map: &mut HashMap<&'a TaskId, NodeIndex>,
        id: &'a TaskId,
    ) -> NodeIndex {
        *node_map.entry(id).or_insert_with(|| graph.add_node(id))
    }

    /// Number of distinct tasks in the snapshot.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of nodes, including dangling references.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the snapshot has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether any dependency records were supplied.
    pub fn has_dependencies(&self) -> bool {
        self.graph.edge_count() > 0
    }

    /// Whether `node` is a snapshot task rather than a dangling reference.
    pub fn is_task(&self, node: NodeIndex) -> bool {
        node.index() < self.tasks.len()
    }

    /// The task at `node`, or `None` for a dangling reference.
    pub fn task(&self, node: NodeIndex) -> Option<&'a Task> {
        self.tasks.get(node.index()).copied()
    }

    /// Snapshot tasks with their nodes, in snapshot order.
    pub fn tasks(&self) -> impl Iterator<Item = (NodeIndex, &'a Task)> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (NodeIndex::new(i), *task))
    }

    /// The id stored at `node`.
    pub fn id(&self, node: NodeIndex) -> &'a TaskId {
        self.graph[node]
    }

    /// Look up the node for an id.
    pub fn node(&self, id: &TaskId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Everything `node` depends on, in dependency-list order, dangling
    /// references and duplicates included.
    pub fn depends_on(&self, node: NodeIndex) -> &[NodeIndex] {
        self.depends_on
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Everything that depends on `node`, in dependency-list order.
    pub fn dependents(&self, node: NodeIndex) -> &[NodeIndex] {
        self.dependents
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The dependencies of `node` that are snapshot tasks.
    pub fn existing_dependencies(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.depends_on(node)
            .iter()
            .copied()
            .filter(|&dep| self.is_task(dep))
    }

    /// Nodes that have at least one dependency, in order of their first
    /// appearance as the dependent side of a record.
    pub fn dependent_order(&self) -> &[NodeIndex] {
        &self.dependent_order
    }

    /// Whether the dependency edges contain a cycle.
    pub fn is_cyclic(&self) -> bool {
        algo::is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn task(id: &str, title: &str) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: TaskId::new(id),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            assignee_id: "u1".to_string(),
            assignee_name: None,
            due_date: at,
            created_at: at,
        }
    }

    #[test]
    fn test_build_forward_and_reverse_adjacency() {
        let tasks = vec![task("a", "A"), task("b", "B"), task("c", "C")];
        let deps = vec![
            Dependency::new("d1", "b", "a"),
            Dependency::new("d2", "c", "a"),
            Dependency::new("d3", "c", "b"),
        ];
        let graph = DependencyGraph::build(&tasks, &deps);

        let a = graph.node(&TaskId::new("a")).unwrap();
        let b = graph.node(&TaskId::new("b")).unwrap();
        let c = graph.node(&TaskId::new("c")).unwrap();

        assert_eq!(graph.depends_on(c), &[a, b]);
        assert_eq!(graph.dependents(a), &[b, c]);
        assert!(graph.depends_on(a).is_empty());
        assert_eq!(graph.dependent_order(), &[b, c]);
        assert!(!graph.is_cyclic());
    }

    #[test]
    fn test_dangling_references_get_nodes_after_tasks() {
        let tasks = vec![task("a", "A")];
        let deps = vec![
            Dependency::new("d1", "a", "ghost"),
            Dependency::new("d2", "phantom", "a"),
        ];
        let graph = DependencyGraph::build(&tasks, &deps);

        assert_eq!(graph.task_count(), 1);
        assert_eq!(graph.node_count(), 3);

        let a = graph.node(&TaskId::new("a")).unwrap();
        let ghost = graph.node(&TaskId::new("ghost")).unwrap();
        assert!(graph.is_task(a));
        assert!(!graph.is_task(ghost));
        assert!(graph.task(ghost).is_none());
        assert_eq!(graph.existing_dependencies(a).count(), 0);
        assert_eq!(graph.dependents(a).len(), 1);
    }

    #[test]
    fn test_duplicate_task_ids_keep_first_position_last_contents() {
        let tasks = vec![task("a", "first"), task("b", "B"), task("a", "second")];
        let graph = DependencyGraph::build(&tasks, &[]);

        assert_eq!(graph.task_count(), 2);
        let (node, first) = graph.tasks().next().unwrap();
        assert_eq!(node.index(), 0);
        assert_eq!(first.title, "second");
    }

    #[test]
    fn test_duplicate_edges_are_preserved() {
        let tasks = vec![task("a", "A"), task("b", "B")];
        let deps = vec![Dependency::new("d1", "b", "a"), Dependency::new("d2", "b", "a")];
        let graph = DependencyGraph::build(&tasks, &deps);

        let a = graph.node(&TaskId::new("a")).unwrap();
        assert_eq!(graph.dependents(a).len(), 2);
    }

    #[test]
    fn test_cycle_is_detected() {
        let tasks = vec![task("a", "A"), task("b", "B")];
        let deps = vec![Dependency::new("d1", "a", "b"), Dependency::new("d2", "b", "a")];
        let graph = DependencyGraph::build(&tasks, &deps);
        assert!(graph.is_cyclic());
    }
}
