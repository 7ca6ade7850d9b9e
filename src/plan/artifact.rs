//! Precomputed task graph artifact (JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{Edge, TaskGraph, TaskGroup};
use super::task::Task;
use crate::errors::{Error, Result};
use crate::validate::{self, ValidationError, SCHEMA_VERSION};

/// Serialized form of a validated [`TaskGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArtifact {
    /// Schema version the graph was validated against.
    pub schema_version: u32,
    /// When the artifact was produced.
    pub generated_at: DateTime<Utc>,
    /// Project name.
    pub project: String,
    /// Tasks in declaration order.
    pub tasks: Vec<Task>,
    /// Named ordered task sequences.
    #[serde(default)]
    pub critical_paths: Vec<TaskGroup>,
    /// Named sets of independently dispatchable tasks.
    #[serde(default)]
    pub parallel_windows: Vec<TaskGroup>,
    /// Derived dependency edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphArtifact {
    /// Captures a graph at the given time.
    #[must_use]
    pub fn from_graph(graph: &TaskGraph, generated_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at,
            project: graph.project().to_string(),
            tasks: graph.tasks().to_vec(),
            critical_paths: graph.critical_paths().to_vec(),
            parallel_windows: graph.parallel_windows().to_vec(),
            edges: graph.edges(),
        }
    }

    /// Rebuilds the graph through the same schema and integrity checks as a
    /// task-definition document, so artifact tasks are normalized the same
    /// way (`blocked_by` duplicates collapsed, blank or empty fields
    /// rejected).
    ///
    /// The stored `edges` are derived data and are ignored; they are
    /// recomputed from `blocked_by`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a schema version mismatch or any
    /// schema or integrity failure.
    pub fn into_graph(self) -> Result<TaskGraph> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::Validation(vec![ValidationError::UnsupportedVersion {
                found: i64::from(self.schema_version),
            }]));
        }
        let document = serde_yaml::to_value(Definition {
            version: SCHEMA_VERSION,
            project: &self.project,
            tasks: &self.tasks,
            critical_paths: &self.critical_paths,
            parallel_windows: &self.parallel_windows,
        })?;
        validate::validate(&document).map_err(Error::Validation)
    }
}

/// The artifact's plan, shaped as a task-definition document.
#[derive(Serialize)]
struct Definition<'a> {
    version: u32,
    project: &'a str,
    tasks: &'a [Task],
    critical_paths: &'a [TaskGroup],
    parallel_windows: &'a [TaskGroup],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::graph::fixtures::graph;

    #[test]
    fn artifact_json_carries_sorted_blocks_edges() {
        let g = graph(&[("T1", &[]), ("T2", &["T1"])]);
        let artifact = GraphArtifact::from_graph(&g, DateTime::<Utc>::UNIX_EPOCH);
        let json = serde_json::to_value(&artifact).unwrap();

        assert_eq!(json["schema_version"], 3);
        assert_eq!(json["edges"][0]["from"], "T1");
        assert_eq!(json["edges"][0]["to"], "T2");
        assert_eq!(json["edges"][0]["type"], "blocks");
    }

    #[test]
    fn loading_rejects_cyclic_artifact() {
        let g = graph(&[("A", &["B"]), ("B", &["A"])]);
        let artifact = GraphArtifact::from_graph(&g, DateTime::<Utc>::UNIX_EPOCH);

        let err = artifact.into_graph().unwrap_err();
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn loading_rejects_other_schema_versions() {
        let g = graph(&[("T1", &[])]);
        let mut artifact = GraphArtifact::from_graph(&g, DateTime::<Utc>::UNIX_EPOCH);
        artifact.schema_version = 2;

        assert!(matches!(artifact.into_graph(), Err(Error::Validation(_))));
    }

    #[test]
    fn loading_collapses_duplicate_dependencies() {
        let g = graph(&[("T1", &[]), ("T2", &["T1", "T1"])]);
        let artifact = GraphArtifact::from_graph(&g, DateTime::<Utc>::UNIX_EPOCH);

        let loaded = artifact.into_graph().unwrap();
        assert_eq!(loaded.task("T2").unwrap().blocked_by, vec!["T1"]);
        assert_eq!(loaded.edges().len(), 1);
    }

    #[test]
    fn loading_applies_required_field_checks() {
        let g = graph(&[("T1", &[]), ("T2", &[])]);
        let mut artifact = GraphArtifact::from_graph(&g, DateTime::<Utc>::UNIX_EPOCH);
        artifact.tasks[0].acceptance.clear();
        artifact.tasks[1].title = "  ".to_string();

        match artifact.into_graph() {
            Err(Error::Validation(errors)) => assert_eq!(
                errors,
                vec![
                    ValidationError::EmptyList {
                        location: "tasks[0] (T1)".to_string(),
                        field: "acceptance",
                    },
                    ValidationError::MissingField {
                        location: "tasks[1] (T2)".to_string(),
                        field: "title",
                    },
                ]
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
