//! The validated, normalized task graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::task::Task;

/// A named group of task IDs: a critical path (ordered) or a parallel
/// window (set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    /// Group identifier, unique within its namespace.
    pub id: String,
    /// Member task IDs.
    pub tasks: Vec<String>,
}

/// A derived dependency edge: `from` must finish before `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// The dependency.
    pub from: String,
    /// The dependent task.
    pub to: String,
    /// Always `"blocks"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// The full plan: tasks in declaration order plus informational groups.
///
/// Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGraph {
    project: String,
    tasks: Vec<Task>,
    critical_paths: Vec<TaskGroup>,
    parallel_windows: Vec<TaskGroup>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    /// Assembles a graph without running integrity checks.
    ///
    /// Callers go through `validate::validate` or `validate::check_graph`.
    /// On duplicate IDs the first declaration wins the index slot.
    #[must_use]
    pub fn new_unchecked(
        project: String,
        tasks: Vec<Task>,
        critical_paths: Vec<TaskGroup>,
        parallel_windows: Vec<TaskGroup>,
    ) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        for (pos, task) in tasks.iter().enumerate() {
            index.entry(task.id.clone()).or_insert(pos);
        }
        Self { project, tasks, critical_paths, parallel_windows, index }
    }

    /// Project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Tasks in declaration order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by ID.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).and_then(|&pos| self.tasks.get(pos))
    }

    /// Returns `true` if the graph declares `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Declaration position of a task.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Named ordered task sequences.
    #[must_use]
    pub fn critical_paths(&self) -> &[TaskGroup] {
        &self.critical_paths
    }

    /// Named sets of independently dispatchable tasks.
    #[must_use]
    pub fn parallel_windows(&self) -> &[TaskGroup] {
        &self.parallel_windows
    }

    /// Dependency edges, deduplicated and sorted by `from` then `to`.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .tasks
            .iter()
            .flat_map(|task| {
                task.blocked_by.iter().map(move |dep| Edge {
                    from: dep.clone(),
                    to: task.id.clone(),
                    kind: "blocks".to_string(),
                })
            })
            .collect();
        edges.sort();
        edges.dedup();
        edges
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::plan::task::{OwnerType, Priority};

    /// Builds a minimal valid task.
    pub fn task(id: &str, blocked_by: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            phase: "build".to_string(),
            priority: Priority::Medium,
            owner_type: OwnerType::Backend,
            estimate: "1d".to_string(),
            blocked_by: blocked_by.iter().map(ToString::to_string).collect(),
            acceptance: vec![format!("{id} works")],
            deliverables: vec![format!("{id} code")],
            context: Vec::new(),
            notes: None,
        }
    }

    /// Builds a graph from `(id, deps)` pairs.
    pub fn graph(specs: &[(&str, &[&str])]) -> TaskGraph {
        let tasks = specs.iter().map(|(id, deps)| task(id, deps)).collect();
        TaskGraph::new_unchecked("demo".to_string(), tasks, Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::graph;

    #[test]
    fn edges_point_from_dependency_to_dependent_in_sorted_order() {
        let g = graph(&[("b", &[]), ("a", &[]), ("c", &["b", "a"]), ("d", &["a"])]);
        let pairs: Vec<(String, String)> =
            g.edges().into_iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "c".to_string()),
                ("a".to_string(), "d".to_string()),
                ("b".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn lookup_by_id_uses_declaration_position() {
        let g = graph(&[("x", &[]), ("y", &["x"])]);
        assert_eq!(g.position("y"), Some(1));
        assert_eq!(g.task("x").map(|t| t.title.as_str()), Some("Task x"));
        assert!(!g.contains("z"));
    }
}
