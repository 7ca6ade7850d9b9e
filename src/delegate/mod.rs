//! Delegation: everything a worker needs to carry out one task.
//!
//! [`assemble`] turns a ready task into a machine-readable
//! [`DelegationPayload`] and a prompt rendering of the same fields. It reads
//! the graph, the snapshot and the spec text it is given; it performs no IO.

mod excerpt;
mod prompt;

use serde::Serialize;

pub use excerpt::{
    extract, heading_slugs, slugify, spec_anchors, ExcerptWarning, FULL_SPEC_LINE_LIMIT,
};
pub use prompt::render;

use crate::errors::{Error, Result};
use crate::plan::TaskGraph;
use crate::readiness;
use crate::status::{StatusSnapshot, TaskState};

/// Fields a worker must report back, with a short description of each.
pub const RESPONSE_FIELDS: &[(&str, &str)] = &[
    ("result", "one of: done, blocked, failed"),
    ("summary", "what was done, or why it could not be done"),
    ("files_changed", "paths created or modified"),
    ("tests_run", "test commands run and their outcome"),
    ("blockers", "what prevents progress (blocked or failed only)"),
    ("next_unblocked_tasks", "task ids this work unblocks"),
];

/// Result of a finished dependency, as handed to the next worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyResult {
    /// The dependency.
    pub task_id: String,
    /// Its worker's summary, empty when none was reported.
    pub result_summary: String,
    /// Files its worker reported touching.
    pub files_changed: Vec<String>,
}

/// Machine-readable delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationPayload {
    /// Task being delegated.
    pub task_id: String,
    /// Task title.
    pub title: String,
    /// Acceptance criteria.
    pub acceptance: Vec<String>,
    /// Expected outputs.
    pub deliverables: Vec<String>,
    /// Hints: paths, spec anchors, free text.
    pub context: Vec<String>,
    /// Project the task belongs to.
    pub project: String,
    /// Results of the task's dependencies, in `blocked_by` order.
    pub dependency_results: Vec<DependencyResult>,
    /// What the worker must report back.
    pub response_format: Vec<ResponseField>,
    /// Relevant spec text, when any was selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_excerpt: Option<String>,
}

/// One entry of [`DelegationPayload::response_format`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseField {
    /// Field name.
    pub field: &'static str,
    /// What goes in it.
    pub description: &'static str,
}

/// A payload, its prompt, and anything worth telling the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delegation {
    /// Structured payload.
    pub payload: DelegationPayload,
    /// Prompt text for the worker.
    pub prompt: String,
    /// Why the excerpt was omitted, if it was.
    pub warnings: Vec<ExcerptWarning>,
}

/// Builds the delegation for `task_id`.
///
/// # Errors
///
/// Returns [`Error::UnknownTask`] when the task is not in the graph, or
/// [`Error::NotDispatchable`] when it is not `todo` or a dependency is not
/// `done`.
pub fn assemble(
    graph: &TaskGraph,
    snapshot: &StatusSnapshot,
    task_id: &str,
    spec: Option<&str>,
) -> Result<Delegation> {
    let task = graph.task(task_id).ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;
    let state = snapshot.state(task_id).unwrap_or_default();
    let unresolved = readiness::unresolved_dependencies(graph, snapshot, task_id);
    if state != TaskState::Todo || !unresolved.is_empty() {
        return Err(Error::NotDispatchable { task_id: task_id.to_string(), state, unresolved });
    }

    let dependency_results = task
        .blocked_by
        .iter()
        .map(|dep| {
            let record = snapshot.record(dep);
            DependencyResult {
                task_id: dep.clone(),
                result_summary: record
                    .and_then(|r| r.result_summary.clone())
                    .unwrap_or_default(),
                files_changed: record.map(|r| r.files_changed.clone()).unwrap_or_default(),
            }
        })
        .collect();

    let mut warnings = Vec::new();
    let spec_excerpt = match extract(spec, &task.context) {
        Ok(text) => Some(text),
        Err(warning) => {
            warnings.push(warning);
            None
        }
    };

    let payload = DelegationPayload {
        task_id: task.id.clone(),
        title: task.title.clone(),
        acceptance: task.acceptance.clone(),
        deliverables: task.deliverables.clone(),
        context: task.context.clone(),
        project: graph.project().to_string(),
        dependency_results,
        response_format: RESPONSE_FIELDS
            .iter()
            .map(|&(field, description)| ResponseField { field, description })
            .collect(),
        spec_excerpt,
    };
    let prompt = render(&payload);

    Ok(Delegation { payload, prompt, warnings })
}
