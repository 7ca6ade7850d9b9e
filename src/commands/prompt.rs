//! `taskgate prompt` command.

use super::{resolve_target, to_json, Output};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::delegate::{self, Delegation};
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::status::LoadOptions;

/// Prints the delegation for a task without changing its status.
///
/// # Errors
///
/// Returns [`crate::errors::Error::NoReadyTasks`] when no task is named and
/// none is ready, or the assembler's error for a task that cannot be
/// dispatched.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    task_id: Option<&str>,
    json: bool,
) -> Result<Output> {
    let spec = settings.read_spec(ctx)?;
    let mut store = settings.open_store(ctx)?;
    let session = store.open(graph, LoadOptions::reevaluate())?;
    let target = resolve_target(graph, session.snapshot(), task_id)?;
    let delegation = delegate::assemble(graph, session.snapshot(), &target, spec.as_deref())?;
    let warnings = session.warnings().to_vec();
    session.rollback();

    render(delegation, warnings, json)
}

/// Shared by `prompt` and `dispatch`.
pub(super) fn render(
    delegation: Delegation,
    mut warnings: Vec<String>,
    json: bool,
) -> Result<Output> {
    warnings.extend(delegation.warnings.iter().map(ToString::to_string));
    let mut out = Output { warnings, ..Output::default() };
    if json {
        out.line(to_json(&delegation.payload)?);
    } else {
        out.stdout = delegation.prompt;
    }
    Ok(out)
}
