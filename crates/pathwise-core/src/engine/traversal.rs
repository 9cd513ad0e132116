//! Cycle-tolerant memoized traversal over the dependency arena.
//!
//! Both the earliest-finish pass and the chain-depth pass compute a value per
//! task as the maximum of a per-task seed and a lifted value of each existing
//! dependency. They differ only in the seed, the lift, and what a cycle
//! contributes. The traversal is an explicit stack so that long chains do not
//! grow the call stack.
//!
//! Cycle policy: a dependency that is already on the current path is not
//! descended into; it contributes `on_cycle(node, memo)` instead. Values
//! memoized inside a cycle depend on where the cycle was entered, which is why
//! roots are visited in snapshot order.

use crate::domain::Task;
use crate::graph::DependencyGraph;
use petgraph::graph::NodeIndex;

struct Frame<T> {
    node: NodeIndex,
    next: usize,
    acc: T,
}

/// Resolve one value per snapshot task, indexed by node.
///
/// - `seed(node, task)`: the task's own contribution
/// - `lift(value)`: how a dependency's value counts toward its dependent
/// - `on_cycle(node, memo)`: the value of a dependency found on the current path
pub(crate) fn resolve_max<T, S, L, C>(
    graph: &DependencyGraph<'_>,
    seed: S,
    lift: L,
    on_cycle: C,
) -> Vec<T>
where
    T: Copy + Ord,
    S: Fn(NodeIndex, &Task) -> T,
    L: Fn(T) -> T,
    C: Fn(NodeIndex, Option<T>) -> T,
{
    let tasks: Vec<&Task> = graph.tasks().map(|(_, task)| task).collect();
    let mut memo: Vec<Option<T>> = vec![None; tasks.len()];
    let mut on_path = vec![false; tasks.len()];
    let mut stack: Vec<Frame<T>> = Vec::new();

    for root in 0..tasks.len() {
        if memo[root].is_some() {
            continue;
        }

        let root = NodeIndex::new(root);
        on_path[root.index()] = true;
        stack.push(Frame {
            node: root,
            next: 0,
            acc: seed(root, tasks[root.index()]),
        });

        while let Some(top) = stack.len().checked_sub(1) {
            let deps = graph.depends_on(stack[top].node);
            let mut cursor = stack[top].next;
            let child = loop {
                match deps.get(cursor) {
                    Some(&dep) if graph.is_task(dep) => {
                        cursor += 1;
                        break Some(dep);
                    }
                    Some(_) => cursor += 1,
                    None => break None,
                }
            };
            stack[top].next = cursor;

            if let Some(dep) = child {
                let i = dep.index();
                let known = if on_path[i] {
                    Some(on_cycle(dep, memo[i]))
                } else {
                    memo[i]
                };

                match known {
                    Some(value) => {
                        let lifted = lift(value);
                        if lifted > stack[top].acc {
                            stack[top].acc = lifted;
                        }
                    }
                    None => {
                        on_path[i] = true;
                        stack.push(Frame {
                            node: dep,
                            next: 0,
                            acc: seed(dep, tasks[i]),
                        });
                    }
                }
                continue;
            }

            if let Some(done) = stack.pop() {
                memo[done.node.index()] = Some(done.acc);
                on_path[done.node.index()] = false;

                if let Some(parent) = stack.last_mut() {
                    let lifted = lift(done.acc);
                    if lifted > parent.acc {
                        parent.acc = lifted;
                    }
                }
            }
        }
    }

    memo.into_iter()
        .zip(tasks)
        .enumerate()
        .map(|(i, (value, task))| value.unwrap_or_else(|| seed(NodeIndex::new(i), task)))
        .collect()
}
