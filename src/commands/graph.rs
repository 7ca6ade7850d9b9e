//! `taskgate graph` command.

use std::path::Path;

use tracing::info;

use super::{to_json, Output};
use crate::context::ServiceContext;
use crate::errors::{Error, Result};
use crate::plan::{GraphArtifact, TaskGraph};

/// Writes the validated graph as a JSON artifact, to `output` or stdout.
///
/// # Errors
///
/// Returns an error if the artifact cannot be serialized or written.
pub fn run(ctx: &ServiceContext, graph: &TaskGraph, output: Option<&Path>) -> Result<Output> {
    let artifact = GraphArtifact::from_graph(graph, ctx.clock.now());
    let mut text = to_json(&artifact)?;
    text.push('\n');

    let mut out = Output::default();
    match output {
        Some(path) => {
            ctx.fs.write(path, &text).map_err(|e| Error::io(path, e))?;
            info!(path = %path.display(), tasks = artifact.tasks.len(), "graph artifact written");
            out.line(format!("wrote {}", path.display()));
        }
        None => out.stdout = text,
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::harness::{fs, run};

    #[test]
    fn artifact_goes_to_stdout_by_default() {
        let out = run(&fs(), &["graph"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
        assert_eq!(value["schema_version"], 3);
        assert_eq!(value["generated_at"], "2026-03-01T12:00:00Z");
        assert_eq!(value["edges"][0]["from"], "T1");
        assert_eq!(value["edges"][0]["to"], "T2");
    }

    #[test]
    fn written_artifact_can_replace_the_plan() {
        let fs = fs();
        let out = run(&fs, &["graph", "--output", "/work/graph.json"]).unwrap();
        assert_eq!(out.stdout, "wrote /work/graph.json\n");

        fs.insert(super::super::harness::PLAN_PATH, "not: [a, plan");
        let out = run(&fs, &["--graph", "/work/graph.json", "ready"]).unwrap();
        assert_eq!(out.stdout, "T1\n");
    }
}
