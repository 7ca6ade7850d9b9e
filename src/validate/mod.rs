//! Plan validation.
//!
//! Validation runs in two exhaustive phases. Schema checks (required fields,
//! types, enum membership, duplicate IDs) run first over the raw document;
//! only a schema-clean document proceeds to integrity checks (dangling
//! references, self-dependencies, cycles). Each phase reports every problem
//! it finds rather than stopping at the first.

mod cycles;
mod schema;

use thiserror::Error;

pub use cycles::find_cycles;

use crate::plan::TaskGraph;

/// The only task-definition schema version accepted.
pub const SCHEMA_VERSION: u32 = 3;

/// A single problem found in a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `version` is not the supported schema version.
    #[error("unsupported schema version {found} (expected {SCHEMA_VERSION})")]
    UnsupportedVersion {
        /// The version found in the document.
        found: i64,
    },

    /// An entry that must be a mapping is something else.
    #[error("{location}: expected a mapping")]
    NotAMapping {
        /// Where the entry sits.
        location: String,
    },

    /// A required field is absent or blank.
    #[error("{location}: missing required field '{field}'")]
    MissingField {
        /// Where the field was expected.
        location: String,
        /// Field name.
        field: &'static str,
    },

    /// A field has the wrong type.
    #[error("{location}: field '{field}' must be {expected}")]
    InvalidType {
        /// Where the field sits.
        location: String,
        /// Field name.
        field: &'static str,
        /// Human description of the expected type.
        expected: &'static str,
    },

    /// A field holds a value outside its enum.
    #[error("{location}: invalid {field} '{value}' (expected one of: {})", .allowed.join(", "))]
    InvalidEnum {
        /// Where the field sits.
        location: String,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted values.
        allowed: &'static [&'static str],
    },

    /// A list that must have entries is empty.
    #[error("{location}: field '{field}' must not be empty")]
    EmptyList {
        /// Where the field sits.
        location: String,
        /// Field name.
        field: &'static str,
    },

    /// Two entries of the same namespace share an ID.
    #[error("duplicate {namespace} id '{id}'")]
    DuplicateId {
        /// "task", "critical path" or "parallel window".
        namespace: &'static str,
        /// The repeated ID.
        id: String,
    },

    /// A reference names a task that does not exist.
    #[error("{location}: {field} references unknown task '{id}'")]
    UnknownReference {
        /// Where the reference sits.
        location: String,
        /// Field holding the reference.
        field: &'static str,
        /// The unknown ID.
        id: String,
    },

    /// A task lists itself in `blocked_by`.
    #[error("task '{task_id}' depends on itself")]
    SelfDependency {
        /// The offending task.
        task_id: String,
    },

    /// The `blocked_by` relation contains a cycle.
    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle {
        /// Cycle path, ending where it started.
        path: Vec<String>,
    },
}

/// Validates a raw task-definition document into a [`TaskGraph`].
///
/// # Errors
///
/// Returns every schema error if any were found; otherwise every integrity
/// error if any were found.
pub fn validate(document: &serde_yaml::Value) -> Result<TaskGraph, Vec<ValidationError>> {
    let graph = schema::parse_document(document)?;
    let errors = check_graph(&graph);
    if errors.is_empty() {
        Ok(graph)
    } else {
        Err(errors)
    }
}

/// Runs duplicate-ID and integrity checks against an assembled graph.
///
/// This is the integrity phase of [`validate`], exposed for graphs that
/// were assembled in code.
#[must_use]
pub fn check_graph(graph: &TaskGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(schema::duplicate_ids("task", graph.tasks().iter().map(|t| t.id.as_str())));
    errors.extend(schema::duplicate_ids(
        "critical path",
        graph.critical_paths().iter().map(|g| g.id.as_str()),
    ));
    errors.extend(schema::duplicate_ids(
        "parallel window",
        graph.parallel_windows().iter().map(|g| g.id.as_str()),
    ));

    for (pos, task) in graph.tasks().iter().enumerate() {
        let location = format!("tasks[{pos}] ({})", task.id);
        let mut reported_self = false;
        for dep in &task.blocked_by {
            if dep == &task.id {
                if !reported_self {
                    errors.push(ValidationError::SelfDependency { task_id: task.id.clone() });
                    reported_self = true;
                }
            } else if !graph.contains(dep) {
                errors.push(ValidationError::UnknownReference {
                    location: location.clone(),
                    field: "blocked_by",
                    id: dep.clone(),
                });
            }
        }
    }

    for (namespace, groups) in
        [("critical_paths", graph.critical_paths()), ("parallel_windows", graph.parallel_windows())]
    {
        for (pos, group) in groups.iter().enumerate() {
            for id in group.tasks.iter().filter(|id| !graph.contains(id)) {
                errors.push(ValidationError::UnknownReference {
                    location: format!("{namespace}[{pos}] ({})", group.id),
                    field: "tasks",
                    id: id.clone(),
                });
            }
        }
    }

    errors.extend(find_cycles(graph).into_iter().map(|path| ValidationError::Cycle { path }));
    errors
}
