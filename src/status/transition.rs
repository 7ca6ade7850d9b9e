//! Lifecycle transitions: `start` and `complete`.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use super::record::TaskState;
use super::snapshot::StatusSnapshot;
use crate::errors::{Error, Result};
use crate::plan::TaskGraph;
use crate::readiness;

/// Outcome a worker reports for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    /// The task is finished.
    Done,
    /// The worker could not proceed.
    Blocked,
    /// The worker tried and failed.
    Failed,
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
        })
    }
}

/// Everything a worker reports back when finishing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    /// Reported outcome.
    pub result: TaskResult,
    /// Free-text summary.
    pub summary: String,
    /// Files touched.
    pub files_changed: Vec<String>,
    /// Tests run.
    pub tests_run: Vec<String>,
    /// Reasons the task is blocked (ignored for `done`).
    pub blockers: Vec<String>,
    /// Tasks the worker believes are now unblocked.
    pub next_unblocked: Vec<String>,
    /// Overrides the recorded owner when set.
    pub owner: Option<String>,
}

impl CompletionReport {
    /// A report with only a result and summary.
    #[must_use]
    pub fn new(result: TaskResult, summary: impl Into<String>) -> Self {
        Self {
            result,
            summary: summary.into(),
            files_changed: Vec::new(),
            tests_run: Vec::new(),
            blockers: Vec::new(),
            next_unblocked: Vec::new(),
            owner: None,
        }
    }
}

impl StatusSnapshot {
    /// Moves a ready task to `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] for IDs outside the graph and
    /// [`Error::NotDispatchable`] when the task is not `todo` or waits on
    /// dependencies. The snapshot is untouched on error.
    pub fn start(
        &mut self,
        graph: &TaskGraph,
        task_id: &str,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let state = self.dispatchable_state(graph, task_id)?;
        if state != TaskState::Todo {
            return Err(Error::NotDispatchable {
                task_id: task_id.to_string(),
                state,
                unresolved: Vec::new(),
            });
        }

        let record = self
            .records
            .get_mut(task_id)
            .ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;
        record.state = TaskState::InProgress;
        record.owner = Some(owner.to_string());
        record.attempts += 1;
        record.started_at = Some(now);
        record.finished_at = None;
        record.blockers.clear();
        record.files_changed.clear();
        record.tests_run.clear();
        record.next_unblocked_tasks.clear();
        record.result_summary = None;
        info!(task = task_id, owner, attempts = record.attempts, "task started");

        self.refresh_summary();
        Ok(())
    }

    /// Records a worker's result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] for IDs outside the graph, including
    /// retained records of tasks removed from the plan, and
    /// [`Error::InvalidTransition`] when the task is already `done` or
    /// `blocked`. The snapshot is untouched on error.
    pub fn complete(
        &mut self,
        graph: &TaskGraph,
        task_id: &str,
        report: CompletionReport,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !graph.contains(task_id) {
            return Err(Error::UnknownTask(task_id.to_string()));
        }
        let record = self
            .records
            .get_mut(task_id)
            .ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;
        if !matches!(record.state, TaskState::Todo | TaskState::InProgress) {
            return Err(Error::InvalidTransition { task_id: task_id.to_string(), from: record.state });
        }

        match report.result {
            TaskResult::Done => {
                record.state = TaskState::Done;
                record.blockers.clear();
            }
            TaskResult::Blocked | TaskResult::Failed => {
                record.state = TaskState::Blocked;
                record.blockers = if report.blockers.is_empty() {
                    vec![format!("task reported {}", report.result)]
                } else {
                    report.blockers
                };
            }
        }
        if let Some(owner) = report.owner {
            record.owner = Some(owner);
        }
        record.finished_at = Some(now);
        if record.started_at.is_none() {
            record.started_at = Some(now);
        }
        record.result_summary = Some(report.summary);
        record.files_changed = report.files_changed;
        record.tests_run = report.tests_run;
        record.next_unblocked_tasks = report.next_unblocked;
        info!(task = task_id, result = %report.result, state = %record.state, "task completed");

        self.refresh_summary();
        Ok(())
    }

    /// Checks dependencies, returning the task's current state.
    fn dispatchable_state(&self, graph: &TaskGraph, task_id: &str) -> Result<TaskState> {
        if !graph.contains(task_id) {
            return Err(Error::UnknownTask(task_id.to_string()));
        }
        let state = self.state(task_id).unwrap_or_default();
        let unresolved = readiness::unresolved_dependencies(graph, self, task_id);
        if unresolved.is_empty() {
            Ok(state)
        } else {
            Err(Error::NotDispatchable { task_id: task_id.to_string(), state, unresolved })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::graph;
    use crate::status::LoadOptions;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn loaded(g: &TaskGraph) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::empty(g.project());
        snapshot.reconcile(g, LoadOptions::default());
        snapshot
    }

    #[test]
    fn start_then_done_leaves_no_blockers_and_one_attempt() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);

        snapshot.start(&g, "T1", "worker", now()).unwrap();
        snapshot.complete(&g, "T1", CompletionReport::new(TaskResult::Done, "shipped"), now()).unwrap();

        let record = snapshot.record("T1").unwrap();
        assert_eq!(record.state, TaskState::Done);
        assert!(record.blockers.is_empty());
        assert_eq!(record.attempts, 1);
        assert_eq!(record.result_summary.as_deref(), Some("shipped"));
        assert_eq!(snapshot.summary().done, 1);
    }

    #[test]
    fn start_requires_done_dependencies() {
        let g = graph(&[("T1", &[]), ("T2", &["T1"])]);
        let mut snapshot = loaded(&g);

        let err = snapshot.start(&g, "T2", "worker", now()).unwrap_err();
        match err {
            Error::NotDispatchable { unresolved, state, .. } => {
                assert_eq!(unresolved, vec!["T1"]);
                assert_eq!(state, TaskState::Todo);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(snapshot.state("T2"), Some(TaskState::Todo));
    }

    #[test]
    fn start_rejects_tasks_already_in_progress() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);
        snapshot.start(&g, "T1", "a", now()).unwrap();

        let err = snapshot.start(&g, "T1", "b", now()).unwrap_err();
        assert!(matches!(err, Error::NotDispatchable { state: TaskState::InProgress, .. }));
        assert_eq!(snapshot.record("T1").unwrap().owner.as_deref(), Some("a"));
    }

    #[test]
    fn start_clears_previous_results() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);
        let mut report = CompletionReport::new(TaskResult::Failed, "broke");
        report.files_changed = vec!["src/lib.rs".to_string()];
        snapshot.complete(&g, "T1", report, now()).unwrap();
        snapshot.records.get_mut("T1").unwrap().state = TaskState::Todo;

        snapshot.start(&g, "T1", "worker", now()).unwrap();
        let record = snapshot.record("T1").unwrap();
        assert!(record.files_changed.is_empty());
        assert!(record.blockers.is_empty());
        assert_eq!(record.result_summary, None);
        assert_eq!(record.finished_at, None);
    }

    #[test]
    fn failed_without_blockers_gets_synthetic_blocker() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);

        snapshot.complete(&g, "T1", CompletionReport::new(TaskResult::Failed, "nope"), now()).unwrap();
        let record = snapshot.record("T1").unwrap();
        assert_eq!(record.state, TaskState::Blocked);
        assert_eq!(record.blockers, vec!["task reported failed"]);
        assert_eq!(record.started_at, Some(now()));
    }

    #[test]
    fn blocked_keeps_reported_blockers() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);
        let mut report = CompletionReport::new(TaskResult::Blocked, "waiting");
        report.blockers = vec!["need API key".to_string()];
        report.owner = Some("bob".to_string());

        snapshot.complete(&g, "T1", report, now()).unwrap();
        let record = snapshot.record("T1").unwrap();
        assert_eq!(record.blockers, vec!["need API key"]);
        assert_eq!(record.owner.as_deref(), Some("bob"));
    }

    #[test]
    fn complete_rejects_finished_tasks() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);
        snapshot.complete(&g, "T1", CompletionReport::new(TaskResult::Done, "ok"), now()).unwrap();
        let before = snapshot.clone();

        let err = snapshot
            .complete(&g, "T1", CompletionReport::new(TaskResult::Failed, "again"), now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { from: TaskState::Done, .. }));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn unknown_task_is_rejected() {
        let g = graph(&[("T1", &[])]);
        let mut snapshot = loaded(&g);
        assert!(matches!(
            snapshot.start(&g, "T9", "w", now()),
            Err(Error::UnknownTask(id)) if id == "T9"
        ));
    }

    #[test]
    fn completing_a_task_removed_from_the_plan_is_rejected() {
        let before = graph(&[("T1", &[]), ("gone", &[])]);
        let mut snapshot = loaded(&before);
        let after = graph(&[("T1", &[])]);
        snapshot.reconcile(&after, LoadOptions::default());
        assert!(snapshot.record("gone").is_some());
        let untouched = snapshot.clone();

        let err = snapshot
            .complete(&after, "gone", CompletionReport::new(TaskResult::Done, "ok"), now())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTask(id) if id == "gone"));
        assert_eq!(snapshot, untouched);
    }
}
