//! Command dispatch and handlers.
//!
//! Handlers return an [`Output`] instead of printing, so they can be driven
//! against an in-memory context in tests. [`dispatch()`] prints it.

pub mod complete;
pub mod dispatch;
pub mod graph;
pub mod init;
pub mod prompt;
pub mod ready;
pub mod start;
pub mod status;
pub mod validate;

use std::io::Write;

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::{Error, Result};
use crate::plan::{self, TaskGraph};
use crate::readiness;
use crate::status::StatusSnapshot;

/// What a command produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
    /// Text for stdout.
    pub stdout: String,
    /// Messages for stderr, one per line.
    pub warnings: Vec<String>,
}

impl Output {
    fn line(&mut self, text: impl AsRef<str>) {
        self.stdout.push_str(text.as_ref());
        self.stdout.push('\n');
    }
}

/// Runs a parsed command against the live system and prints the result.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> std::result::Result<(), String> {
    let ctx = ServiceContext::live();
    let output = execute(&ctx, cli).map_err(|e| e.to_string())?;

    let mut stderr = std::io::stderr().lock();
    for warning in &output.warnings {
        let _ = writeln!(stderr, "warning: {warning}");
    }
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.stdout.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| format!("failed to write output: {e}"))
}

/// Runs a parsed command with the given service context.
///
/// # Errors
///
/// Returns the command's error; nothing is persisted in that case.
pub fn execute(ctx: &ServiceContext, cli: &Cli) -> Result<Output> {
    let args = &cli.global;
    let graph = plan::load(ctx, &args.plan, args.graph.as_deref())?;
    let settings = Settings::resolve(ctx, args, graph.project())?;

    match &cli.command {
        Command::Validate => validate::run(ctx, &graph, &settings),
        Command::Graph { output } => graph::run(ctx, &graph, output.as_deref()),
        Command::Init => init::run(ctx, &graph, &settings),
        Command::Ready { json } => ready::run(ctx, &graph, &settings, *json),
        Command::Prompt { task_id, json } => {
            prompt::run(ctx, &graph, &settings, task_id.as_deref(), *json)
        }
        Command::Start { task_id, owner } => start::run(ctx, &graph, &settings, task_id, owner),
        Command::Dispatch { task_id, owner, json } => {
            dispatch::run(ctx, &graph, &settings, task_id.as_deref(), owner, *json)
        }
        Command::Complete(complete_args) => complete::run(ctx, &graph, &settings, complete_args),
        Command::Status { json } => status::run(ctx, &graph, &settings, *json),
    }
}

/// The explicit task, or the first ready one.
fn resolve_target(
    graph: &TaskGraph,
    snapshot: &StatusSnapshot,
    explicit: Option<&str>,
) -> Result<String> {
    match explicit {
        Some(id) => Ok(id.to_string()),
        None => readiness::ready(graph, snapshot).into_iter().next().ok_or(Error::NoReadyTasks),
    }
}

fn to_json(value: &impl serde::Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
