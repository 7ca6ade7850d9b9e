//! `taskgate dispatch` command: `prompt` and `start` in one session.

use super::{prompt, resolve_target, Output};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::delegate;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::status::LoadOptions;

/// Picks a task, assembles its delegation and marks it in progress.
///
/// The prompt is only returned once the start has been committed, so a
/// worker never receives a task another session also claimed.
///
/// # Errors
///
/// Returns [`crate::errors::Error::NoReadyTasks`], an assembler error, or a
/// store error; nothing is persisted in any of those cases.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    task_id: Option<&str>,
    owner: &str,
    json: bool,
) -> Result<Output> {
    let spec = settings.read_spec(ctx)?;
    let mut store = settings.open_store(ctx)?;
    let mut session = store.open(graph, LoadOptions::reevaluate())?;
    let target = resolve_target(graph, session.snapshot(), task_id)?;
    let delegation = delegate::assemble(graph, session.snapshot(), &target, spec.as_deref())?;
    session.start(graph, &target, owner)?;
    let warnings = session.warnings().to_vec();
    session.commit()?;

    prompt::render(delegation, warnings, json)
}
