//! The full status snapshot and its wire document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::{Summary, TaskState, TaskStatusRecord};
use crate::plan::TaskGraph;

/// Version of the status snapshot artifact.
pub const STATUS_SCHEMA_VERSION: u32 = 3;

/// Serialized shape of a status snapshot.
///
/// Records stay as raw JSON values until [`StatusSnapshot::from_document`]
/// parses them one by one, so a bad record can be named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Project the snapshot belongs to.
    pub project: String,
    /// Snapshot schema version.
    pub schema_version: u32,
    /// When the snapshot was last committed.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Per-state counts. Ignored on read; always recomputed.
    #[serde(default)]
    pub summary: Summary,
    /// Task ID → record.
    #[serde(default)]
    pub tasks: BTreeMap<String, serde_json::Value>,
}

/// What to repair while loading a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Force `in_progress` records back to `todo` and clear their owner.
    pub reset_in_progress: bool,
    /// Move `blocked` records whose blockers are all done tasks back to `todo`.
    pub reevaluate_blocked: bool,
}

impl LoadOptions {
    /// Options used when starting a fresh orchestration session.
    #[must_use]
    pub const fn recover() -> Self {
        Self { reset_in_progress: true, reevaluate_blocked: true }
    }

    /// Options used by ordinary commands.
    #[must_use]
    pub const fn reevaluate() -> Self {
        Self { reset_in_progress: false, reevaluate_blocked: true }
    }
}

/// All task records for one plan at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub(super) project: String,
    pub(super) updated_at: Option<DateTime<Utc>>,
    pub(super) summary: Summary,
    pub(super) records: BTreeMap<String, TaskStatusRecord>,
}

impl StatusSnapshot {
    /// An empty snapshot for a project.
    #[must_use]
    pub fn empty(project: &str) -> Self {
        Self {
            project: project.to_string(),
            updated_at: None,
            summary: Summary::default(),
            records: BTreeMap::new(),
        }
    }

    /// Parses a stored document, record by record.
    ///
    /// # Errors
    ///
    /// Returns a description of the first record that does not match the
    /// record shape, or of an unsupported schema version.
    pub fn from_document(document: SnapshotDocument) -> Result<Self, String> {
        if document.schema_version != STATUS_SCHEMA_VERSION {
            return Err(format!(
                "unsupported status schema version {} (expected {STATUS_SCHEMA_VERSION})",
                document.schema_version
            ));
        }
        let mut records = BTreeMap::new();
        for (task_id, value) in document.tasks {
            let record: TaskStatusRecord = serde_json::from_value(value)
                .map_err(|e| format!("record for task '{task_id}': {e}"))?;
            records.insert(task_id, record);
        }
        let summary = Summary::count(records.values());
        Ok(Self { project: document.project, updated_at: document.updated_at, summary, records })
    }

    /// Serializes into the wire document.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if a record cannot be converted.
    pub fn to_document(&self) -> serde_json::Result<SnapshotDocument> {
        let tasks = self
            .records
            .iter()
            .map(|(id, record)| Ok((id.clone(), serde_json::to_value(record)?)))
            .collect::<serde_json::Result<_>>()?;
        Ok(SnapshotDocument {
            project: self.project.clone(),
            schema_version: STATUS_SCHEMA_VERSION,
            updated_at: self.updated_at,
            summary: self.summary,
            tasks,
        })
    }

    /// Project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// When the snapshot was last committed.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Per-state counts, always consistent with the records.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Looks up a task's record.
    #[must_use]
    pub fn record(&self, task_id: &str) -> Option<&TaskStatusRecord> {
        self.records.get(task_id)
    }

    /// State of a task, if it has a record.
    #[must_use]
    pub fn state(&self, task_id: &str) -> Option<TaskState> {
        self.records.get(task_id).map(|r| r.state)
    }

    /// All records, ordered by task ID.
    pub fn records(&self) -> impl Iterator<Item = (&str, &TaskStatusRecord)> {
        self.records.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Aligns the snapshot with the graph and applies the load repairs.
    ///
    /// Returns human-readable warnings.
    pub fn reconcile(&mut self, graph: &TaskGraph, options: LoadOptions) -> Vec<String> {
        let mut warnings = Vec::new();

        for task in graph.tasks() {
            if !self.records.contains_key(&task.id) {
                debug!(task = %task.id, "creating default status record");
                self.records.insert(task.id.clone(), TaskStatusRecord::default());
            }
        }

        for id in self.records.keys().filter(|id| !graph.contains(id)) {
            warnings.push(format!("status record for unknown task '{id}' retained"));
        }

        if options.reset_in_progress {
            for (id, record) in &mut self.records {
                if record.state == TaskState::InProgress {
                    warn!(task = %id, owner = ?record.owner, "resetting stale in-progress task");
                    record.state = TaskState::Todo;
                    record.owner = None;
                }
            }
        }

        if options.reevaluate_blocked {
            let done: Vec<String> = self
                .records
                .iter()
                .filter(|(_, r)| r.state == TaskState::Done)
                .map(|(id, _)| id.clone())
                .collect();
            for (id, record) in &mut self.records {
                if record.state == TaskState::Blocked
                    && !record.blockers.is_empty()
                    && record.blockers.iter().all(|b| done.contains(b))
                {
                    debug!(task = %id, "blockers resolved, returning task to todo");
                    record.state = TaskState::Todo;
                    record.blockers.clear();
                }
            }
        }

        self.refresh_summary();
        warnings
    }

    /// Stamps the commit time.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub(super) fn refresh_summary(&mut self) {
        self.summary = Summary::count(self.records.values());
    }
}
