//! `taskgate ready` command.

use super::{to_json, Output};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::readiness;
use crate::status::LoadOptions;

/// Lists tasks that can be dispatched now, in graph order.
///
/// Blocked tasks whose blockers have since finished are returned to `todo`
/// and that change is committed.
///
/// # Errors
///
/// Returns store errors; nothing is persisted in that case.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    json: bool,
) -> Result<Output> {
    let mut store = settings.open_store(ctx)?;
    let session = store.open(graph, LoadOptions::reevaluate())?;
    let warnings = session.warnings().to_vec();
    let snapshot = session.commit()?;
    let ready = readiness::ready(graph, &snapshot);

    let mut out = Output { warnings, ..Output::default() };
    if json {
        out.line(to_json(&ready)?);
    } else {
        for id in &ready {
            out.line(id);
        }
    }
    Ok(out)
}
