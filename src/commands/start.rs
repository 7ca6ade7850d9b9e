//! `taskgate start` command.

use super::Output;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::status::LoadOptions;

/// Marks a ready task as in progress for `owner`.
///
/// # Errors
///
/// Returns the transition's error when the task is unknown or not ready;
/// nothing is persisted in that case.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    task_id: &str,
    owner: &str,
) -> Result<Output> {
    let mut store = settings.open_store(ctx)?;
    let mut session = store.open(graph, LoadOptions::reevaluate())?;
    session.start(graph, task_id, owner)?;
    let warnings = session.warnings().to_vec();
    let snapshot = session.commit()?;

    let attempts = snapshot.record(task_id).map_or(0, |r| r.attempts);
    let mut out = Output { warnings, ..Output::default() };
    out.line(format!("started {task_id} (owner: {owner}, attempt {attempts})"));
    Ok(out)
}
