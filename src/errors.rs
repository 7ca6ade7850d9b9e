//! Crate-wide error type.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::status::TaskState;
use crate::validate::ValidationError;

/// Every way a `taskgate` command can fail.
///
/// All variants are terminal for the current invocation; nothing is
/// persisted once one of these has been raised.
#[derive(Error, Debug)]
pub enum Error {
    /// The task-definition document or graph artifact is invalid.
    #[error("plan validation failed with {} error(s):\n{}", .0.len(), render_list(.0))]
    Validation(Vec<ValidationError>),

    /// A task ID does not exist in the loaded graph.
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    /// The task is not in `todo` or still waits on dependencies.
    #[error("task '{task_id}' is not dispatchable (state: {state}{})", unresolved_suffix(.unresolved))]
    NotDispatchable {
        /// The task that was asked for.
        task_id: String,
        /// Its current state.
        state: TaskState,
        /// Dependencies not yet `done`, in `blocked_by` order.
        unresolved: Vec<String>,
    },

    /// A completion was reported for a task that already finished.
    #[error("task '{task_id}' cannot be completed from state {from}")]
    InvalidTransition {
        /// The task that was asked for.
        task_id: String,
        /// Its current state.
        from: TaskState,
    },

    /// No task is ready and none was named explicitly.
    #[error("no ready tasks")]
    NoReadyTasks,

    /// Another process holds the write transaction.
    #[error(
        "status store at {} is locked by another session{}",
        .path.display(),
        stale_lock_hint(.path)
    )]
    StoreBusy {
        /// The lock file or database that could not be acquired.
        path: PathBuf,
    },

    /// Stored state could not be parsed into status records.
    #[error("corrupt status store {}: {reason}", .path.display())]
    CorruptStore {
        /// The artifact that failed to parse.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Embedded database failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

fn render_list(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
}

/// Lock files outlive a killed process; SQLite locks do not.
fn stale_lock_hint(path: &Path) -> String {
    if path.extension().is_some_and(|ext| ext == "lock") {
        format!("; if no other taskgate process is running, remove {}", path.display())
    } else {
        String::new()
    }
}

fn unresolved_suffix(unresolved: &[String]) -> String {
    if unresolved.is_empty() {
        String::new()
    } else {
        format!(", waiting on: {}", unresolved.join(", "))
    }
}
