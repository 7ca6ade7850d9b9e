//! Plan types: tasks, the validated task graph, and the graph artifact.
//!
//! A plan is read either from a YAML task-definition document (validated by
//! [`crate::validate`]) or from a precomputed JSON [`GraphArtifact`].

mod artifact;
mod graph;
mod task;

use std::path::Path;

use tracing::debug;

pub use artifact::GraphArtifact;
pub use graph::{Edge, TaskGraph, TaskGroup};
pub use task::{OwnerType, Priority, Task};

#[cfg(test)]
pub(crate) use graph::fixtures;

use crate::context::ServiceContext;
use crate::errors::{Error, Result};

/// Parses and validates a task-definition document.
///
/// JSON documents are accepted too, since YAML is a superset.
///
/// # Errors
///
/// Returns [`Error::Yaml`] when the text is not YAML at all, or
/// [`Error::Validation`] with every schema or integrity problem found.
pub fn parse_definition(text: &str) -> Result<TaskGraph> {
    let document: serde_yaml::Value = serde_yaml::from_str(text)?;
    crate::validate::validate(&document).map_err(Error::Validation)
}

/// Loads the plan for this invocation.
///
/// A graph artifact takes precedence over the definition document when one
/// is configured.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or does not hold a
/// valid plan.
pub fn load(
    ctx: &ServiceContext,
    plan_path: &Path,
    artifact_path: Option<&Path>,
) -> Result<TaskGraph> {
    if let Some(path) = artifact_path {
        debug!(path = %path.display(), "loading task graph artifact");
        let text = ctx.fs.read_to_string(path).map_err(|e| Error::io(path, e))?;
        let artifact: GraphArtifact = serde_json::from_str(&text)?;
        return artifact.into_graph();
    }

    debug!(path = %plan_path.display(), "loading task-definition document");
    let text = ctx.fs.read_to_string(plan_path).map_err(|e| Error::io(plan_path, e))?;
    parse_definition(&text)
}
