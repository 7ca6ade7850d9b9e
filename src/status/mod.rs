//! Task status records, snapshots and lifecycle transitions.
//!
//! A [`StatusSnapshot`] owns every [`TaskStatusRecord`] for a plan. Records
//! change only through [`StatusSnapshot::reconcile`],
//! [`StatusSnapshot::start`] and [`StatusSnapshot::complete`]; the aggregate
//! [`Summary`] is recomputed after each of them.

mod record;
mod snapshot;
mod transition;

pub use record::{Summary, TaskState, TaskStatusRecord};
pub use snapshot::{LoadOptions, SnapshotDocument, StatusSnapshot, STATUS_SCHEMA_VERSION};
pub use transition::{CompletionReport, TaskResult};
