//! `taskgate status` command.

use serde::Serialize;

use super::{to_json, Output};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::readiness;
use crate::status::{LoadOptions, SnapshotDocument};

#[derive(Serialize)]
struct StatusReport<'a> {
    status: SnapshotDocument,
    ready: &'a [String],
}

/// Shows the summary, the ready list and a table of every task.
///
/// The store is opened and rolled back, so looking never changes anything.
///
/// # Errors
///
/// Returns store errors.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    json: bool,
) -> Result<Output> {
    let mut store = settings.open_store(ctx)?;
    let session = store.open(graph, LoadOptions::reevaluate())?;
    let snapshot = session.snapshot().clone();
    let warnings = session.warnings().to_vec();
    session.rollback();
    let ready = readiness::ready(graph, &snapshot);

    let mut out = Output { warnings, ..Output::default() };
    if json {
        let status = snapshot.to_document()?;
        out.line(to_json(&StatusReport { status, ready: &ready })?);
        return Ok(out);
    }

    out.line(format!("project: {}", snapshot.project()));
    out.line(snapshot.summary().to_string());
    out.line(format!(
        "ready: {}",
        if ready.is_empty() { "(none)".to_string() } else { ready.join(", ") }
    ));
    out.line("");

    let rows: Vec<[String; 5]> = graph
        .tasks()
        .iter()
        .map(|task| {
            let record = snapshot.record(&task.id);
            [
                task.id.clone(),
                record.map(|r| r.state).unwrap_or_default().to_string(),
                record.and_then(|r| r.owner.clone()).unwrap_or_else(|| "-".to_string()),
                record.map_or(0, |r| r.attempts).to_string(),
                task.title.clone(),
            ]
        })
        .collect();

    let id_width = rows.iter().map(|r| r[0].len()).max().unwrap_or(2).max(2);
    let state_width = rows.iter().map(|r| r[1].len()).max().unwrap_or(5).max(5);
    let owner_width = rows.iter().map(|r| r[2].len()).max().unwrap_or(5).max(5);
    let attempts_width = "ATTEMPTS".len();

    out.line(format!(
        "{:<id_width$}  {:<state_width$}  {:<owner_width$}  {:<attempts_width$}  TITLE",
        "ID", "STATE", "OWNER", "ATTEMPTS",
    ));
    out.line(format!(
        "{:-<id_width$}  {:-<state_width$}  {:-<owner_width$}  {:-<attempts_width$}  -----",
        "", "", "", "",
    ));
    for [id, state, owner, attempts, title] in &rows {
        out.line(format!(
            "{id:<id_width$}  {state:<state_width$}  {owner:<owner_width$}  {attempts:<attempts_width$}  {title}",
        ));
    }
    Ok(out)
}
