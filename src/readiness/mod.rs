//! Readiness: which tasks can be dispatched right now.
//!
//! Pure functions over a graph and a snapshot. Nothing here is persisted.

use crate::plan::TaskGraph;
use crate::status::{StatusSnapshot, TaskState};

/// IDs of tasks that are `todo` with every dependency `done`, in
/// declaration order.
#[must_use]
pub fn ready(graph: &TaskGraph, snapshot: &StatusSnapshot) -> Vec<String> {
    graph
        .tasks()
        .iter()
        .filter(|task| snapshot.state(&task.id) == Some(TaskState::Todo))
        .filter(|task| task.blocked_by.iter().all(|dep| is_done(snapshot, dep)))
        .map(|task| task.id.clone())
        .collect()
}

/// Dependencies of `task_id` not yet `done`, in `blocked_by` order.
///
/// Unknown task IDs have no dependencies.
#[must_use]
pub fn unresolved_dependencies(
    graph: &TaskGraph,
    snapshot: &StatusSnapshot,
    task_id: &str,
) -> Vec<String> {
    graph
        .task(task_id)
        .map(|task| {
            task.blocked_by.iter().filter(|dep| !is_done(snapshot, dep)).cloned().collect()
        })
        .unwrap_or_default()
}

fn is_done(snapshot: &StatusSnapshot, task_id: &str) -> bool {
    snapshot.state(task_id) == Some(TaskState::Done)
}
