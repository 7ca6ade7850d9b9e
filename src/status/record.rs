//! Per-task status record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Not started.
    #[default]
    Todo,
    /// Handed to a worker.
    InProgress,
    /// Finished successfully.
    Done,
    /// Reported blocked or failed.
    Blocked,
}

impl TaskState {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable runtime state of one task.
///
/// Records are only ever mutated through [`super::StatusSnapshot`]
/// transitions; everything else gets a shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskStatusRecord {
    /// Current lifecycle state.
    pub state: TaskState,
    /// Current or last assignee.
    #[serde(default)]
    pub owner: Option<String>,
    /// Number of transitions into `in_progress`.
    #[serde(default)]
    pub attempts: u32,
    /// When the task was last started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When a result was last reported.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Why the task is blocked.
    #[serde(default)]
    pub blockers: Vec<String>,
    /// Files the worker reported touching.
    #[serde(default)]
    pub files_changed: Vec<String>,
    /// Tests the worker reported running.
    #[serde(default)]
    pub tests_run: Vec<String>,
    /// Tasks the worker believes are now unblocked.
    #[serde(default)]
    pub next_unblocked_tasks: Vec<String>,
    /// Worker's summary of the result.
    #[serde(default)]
    pub result_summary: Option<String>,
}

/// Aggregate record counts per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Records in `todo`.
    pub todo: usize,
    /// Records in `in_progress`.
    pub in_progress: usize,
    /// Records in `done`.
    pub done: usize,
    /// Records in `blocked`.
    pub blocked: usize,
}

impl Summary {
    /// Counts the given records.
    pub fn count<'a>(records: impl IntoIterator<Item = &'a TaskStatusRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.state {
                TaskState::Todo => summary.todo += 1,
                TaskState::InProgress => summary.in_progress += 1,
                TaskState::Done => summary.done += 1,
                TaskState::Blocked => summary.blocked += 1,
            }
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "todo: {}, in_progress: {}, done: {}, blocked: {}",
            self.todo, self.in_progress, self.done, self.blocked
        )
    }
}
