//! `taskgate init` command.

use super::Output;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::readiness;
use crate::status::LoadOptions;

/// Loads or creates status for the plan, recovering from an interrupted
/// session: in-progress tasks go back to `todo`.
///
/// # Errors
///
/// Returns store errors; nothing is persisted in that case.
pub fn run(ctx: &ServiceContext, graph: &TaskGraph, settings: &Settings) -> Result<Output> {
    let mut store = settings.open_store(ctx)?;
    let session = store.open(graph, LoadOptions::recover())?;
    let warnings = session.warnings().to_vec();
    let snapshot = session.commit()?;

    let mut out = Output { warnings, ..Output::default() };
    out.line(format!(
        "{}: {} task(s), status in {}",
        graph.project(),
        graph.tasks().len(),
        settings.plan_dir.display()
    ));
    out.line(snapshot.summary().to_string());
    let ready = readiness::ready(graph, &snapshot);
    if ready.is_empty() {
        out.line("ready: (none)");
    } else {
        out.line(format!("ready: {}", ready.join(", ")));
    }
    Ok(out)
}
