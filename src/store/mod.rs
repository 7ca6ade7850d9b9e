//! Status store: durable, transactional persistence of task status.
//!
//! A [`StatusBackend`] hands out one exclusive [`StatusTransaction`] at a
//! time. [`StatusStore::open`] wraps that transaction and the reconciled
//! [`StatusSnapshot`] into a [`Session`]; the session either commits or,
//! when dropped, rolls back. Nothing is written until commit.
//!
//! Layout under the plan's state directory:
//!
//! ```text
//! <state_dir>/<slug>/
//!   ├── status.json   exported snapshot (both backends)
//!   ├── status.db     SQLite database (sqlite backend)
//!   └── status.lock   held while a file-backend session is open
//! ```

mod file;
mod sqlite;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use file::FileBackend;
pub use sqlite::SqliteBackend;

use crate::context::ServiceContext;
use crate::errors::{Error, Result};
use crate::plan::TaskGraph;
use crate::status::{CompletionReport, LoadOptions, SnapshotDocument, StatusSnapshot};

/// One open, exclusive transaction against a backend.
///
/// Dropping the handle without calling [`StatusTransaction::commit`] rolls
/// back and releases exclusivity.
pub trait StatusTransaction {
    /// Reads the stored document, or `None` when nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptStore`] when the stored bytes are not a
    /// snapshot document, or the backend's IO error.
    fn read(&mut self) -> Result<Option<SnapshotDocument>>;

    /// Persists `document` and ends the transaction.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; the previous stored state is kept.
    fn commit(self: Box<Self>, document: &SnapshotDocument) -> Result<()>;
}

/// Storage medium for status snapshots.
pub trait StatusBackend {
    /// Begins an exclusive transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreBusy`] when another session holds the store.
    fn begin(&mut self) -> Result<Box<dyn StatusTransaction + '_>>;

    /// Path named in errors about the stored state.
    fn location(&self) -> PathBuf;
}

/// Entry point for loading and committing status.
pub struct StatusStore<'c> {
    ctx: &'c ServiceContext,
    backend: Box<dyn StatusBackend + 'c>,
    import: Option<Import>,
}

struct Import {
    path: PathBuf,
    required: bool,
}

impl<'c> StatusStore<'c> {
    /// Wraps a backend.
    #[must_use]
    pub fn new(ctx: &'c ServiceContext, backend: Box<dyn StatusBackend + 'c>) -> Self {
        Self { ctx, backend, import: None }
    }

    /// Seeds an empty store from `path`; the file must exist.
    #[must_use]
    pub fn import_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.import = Some(Import { path: path.into(), required: true });
        self
    }

    /// Seeds an empty store from `path` when that file exists.
    #[must_use]
    pub fn import_if_present(mut self, path: impl Into<PathBuf>) -> Self {
        self.import = Some(Import { path: path.into(), required: false });
        self
    }

    /// Begins a session: reads stored state, aligns it with `graph` and
    /// applies the `options` repairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreBusy`] when another writer holds the store,
    /// [`Error::CorruptStore`] when a stored record cannot be parsed, or an
    /// IO error.
    pub fn open(&mut self, graph: &TaskGraph, options: LoadOptions) -> Result<Session<'_>> {
        let location = self.backend.location();
        let mut tx = self.backend.begin()?;
        debug!(store = %location.display(), "status transaction begun");

        let mut warnings = Vec::new();
        let (document, source) = match tx.read()? {
            Some(document) => (Some(document), location),
            None => match &self.import {
                Some(import) => (read_import(self.ctx, import)?, import.path.clone()),
                None => (None, location),
            },
        };

        let mut snapshot = match document {
            Some(document) => {
                if document.project != graph.project() {
                    warnings.push(format!(
                        "status belongs to project '{}' but the plan is '{}'",
                        document.project,
                        graph.project()
                    ));
                }
                StatusSnapshot::from_document(document)
                    .map_err(|reason| Error::CorruptStore { path: source, reason })?
            }
            None => StatusSnapshot::empty(graph.project()),
        };

        warnings.extend(snapshot.reconcile(graph, options));
        for warning in &warnings {
            debug!(%warning, "load warning");
        }

        Ok(Session { ctx: self.ctx, tx, snapshot, warnings })
    }
}

fn read_import(ctx: &ServiceContext, import: &Import) -> Result<Option<SnapshotDocument>> {
    if !import.required && !ctx.fs.exists(&import.path) {
        return Ok(None);
    }
    let text = ctx.fs.read_to_string(&import.path).map_err(|e| Error::io(&import.path, e))?;
    let document: SnapshotDocument = serde_json::from_str(&text).map_err(|e| {
        Error::CorruptStore { path: import.path.clone(), reason: e.to_string() }
    })?;
    info!(path = %import.path.display(), records = document.tasks.len(), "importing status");
    Ok(Some(document))
}

/// A loaded snapshot paired with its open transaction.
///
/// Mutations go through the session so timestamps come from the context
/// clock. Dropping the session discards every change.
pub struct Session<'s> {
    ctx: &'s ServiceContext,
    tx: Box<dyn StatusTransaction + 's>,
    snapshot: StatusSnapshot,
    warnings: Vec<String>,
}

impl Session<'_> {
    /// The current, uncommitted snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Warnings raised while loading.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Moves a ready task to `in_progress`.
    ///
    /// # Errors
    ///
    /// See [`StatusSnapshot::start`].
    pub fn start(&mut self, graph: &TaskGraph, task_id: &str, owner: &str) -> Result<()> {
        let now = self.ctx.clock.now();
        self.snapshot.start(graph, task_id, owner, now)
    }

    /// Records a worker's result.
    ///
    /// # Errors
    ///
    /// See [`StatusSnapshot::complete`].
    pub fn complete(
        &mut self,
        graph: &TaskGraph,
        task_id: &str,
        report: CompletionReport,
    ) -> Result<()> {
        let now = self.ctx.clock.now();
        self.snapshot.complete(graph, task_id, report, now)
    }

    /// Persists the snapshot and returns what was written.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; nothing is persisted in that case.
    pub fn commit(self) -> Result<StatusSnapshot> {
        let Self { ctx, tx, mut snapshot, .. } = self;
        snapshot.touch(ctx.clock.now());
        tx.commit(&snapshot.to_document()?)?;
        debug!(summary = %snapshot.summary(), "status committed");
        Ok(snapshot)
    }

    /// Discards the session's changes.
    pub fn rollback(self) {
        debug!("status transaction rolled back");
    }
}

/// Serializes a document the way it is stored on disk.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn render_document(document: &SnapshotDocument) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}

/// Writes `contents` to a uniquely named sibling of `path`, then renames it
/// over `path`.
pub(crate) fn write_atomic(ctx: &ServiceContext, path: &Path, contents: &str) -> Result<()> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", ctx.id_gen.generate_id()));

    ctx.fs.write(&tmp, contents).map_err(|e| Error::io(&tmp, e))?;
    if let Err(e) = ctx.fs.rename(&tmp, path) {
        if let Err(cleanup) = ctx.fs.remove_file(&tmp) {
            debug!(path = %tmp.display(), error = %cleanup, "could not remove temporary file");
        }
        return Err(Error::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::plan::fixtures::graph;
    use crate::readiness;
    use crate::status::{TaskResult, TaskState};

    const STATUS: &str = "/state/demo/status.json";
    const LOCK: &str = "/state/demo/status.lock";

    fn file_store(ctx: &ServiceContext) -> StatusStore<'_> {
        StatusStore::new(ctx, Box::new(FileBackend::new(ctx, Path::new("/state/demo"))))
    }

    #[test]
    fn commit_persists_and_reopen_sees_it() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let g = graph(&[("T1", &[]), ("T2", &["T1"])]);
        let mut store = file_store(&ctx);

        let mut session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        session.complete(&g, "T1", CompletionReport::new(TaskResult::Done, "ok")).unwrap();
        let committed = session.commit().unwrap();
        assert_eq!(committed.updated_at(), Some(ServiceContext::testing_epoch()));

        let session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        assert_eq!(session.snapshot().state("T1"), Some(TaskState::Done));
        assert_eq!(readiness::ready(&g, session.snapshot()), vec!["T2"]);
        assert!(fs.get(STATUS).is_some());
    }

    #[test]
    fn dropped_session_persists_nothing() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let g = graph(&[("T1", &[])]);
        let mut store = file_store(&ctx);

        let mut session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        session.start(&g, "T1", "worker").unwrap();
        session.rollback();

        assert_eq!(fs.get(STATUS), None);
        assert_eq!(fs.get(LOCK), None);
        let session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        assert_eq!(session.snapshot().state("T1"), Some(TaskState::Todo));
    }

    #[test]
    fn failed_transition_leaves_stored_state_untouched() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let g = graph(&[("T1", &[]), ("T2", &["T1"])]);
        let mut store = file_store(&ctx);
        store.open(&g, LoadOptions::recover()).unwrap().commit().unwrap();
        let before = fs.get(STATUS).unwrap();

        let mut session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        assert!(session.start(&g, "T2", "worker").is_err());
        drop(session);

        assert_eq!(fs.get(STATUS).unwrap(), before);
    }

    #[test]
    fn project_mismatch_is_a_warning() {
        let fs = MemoryFileSystem::new();
        fs.insert(STATUS, r#"{"project": "other", "schema_version": 3, "tasks": {}}"#);
        let ctx = ServiceContext::testing(fs);
        let g = graph(&[("T1", &[])]);
        let mut store = file_store(&ctx);

        let session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        assert_eq!(session.warnings(), ["status belongs to project 'other' but the plan is 'demo'"]);
    }

    #[test]
    fn corrupt_record_names_the_task_and_path() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            STATUS,
            r#"{"project": "demo", "schema_version": 3, "tasks": {"T1": {"state": 7}}}"#,
        );
        let ctx = ServiceContext::testing(fs);
        let g = graph(&[("T1", &[])]);
        let mut store = file_store(&ctx);

        let err = store.open(&g, LoadOptions::reevaluate()).err().unwrap();
        match err {
            Error::CorruptStore { path, reason } => {
                assert_eq!(path, Path::new(STATUS));
                assert!(reason.contains("'T1'"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn import_seeds_an_empty_store() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/seed.json",
            r#"{"project": "demo", "schema_version": 3, "tasks": {"T1": {"state": "done"}}}"#,
        );
        let ctx = ServiceContext::testing(fs);
        let g = graph(&[("T1", &[]), ("T2", &["T1"])]);
        let mut store = file_store(&ctx).import_from("/seed.json");

        let session = store.open(&g, LoadOptions::reevaluate()).unwrap();
        assert_eq!(session.snapshot().state("T1"), Some(TaskState::Done));
        assert_eq!(session.snapshot().state("T2"), Some(TaskState::Todo));
    }

    #[test]
    fn missing_required_import_is_an_error() {
        let ctx = ServiceContext::testing(MemoryFileSystem::new());
        let g = graph(&[("T1", &[])]);
        let mut store = file_store(&ctx).import_from("/seed.json");
        assert!(matches!(store.open(&g, LoadOptions::reevaluate()), Err(Error::Io { .. })));

        let mut store = file_store(&ctx).import_if_present("/seed.json");
        assert!(store.open(&g, LoadOptions::reevaluate()).is_ok());
    }

    #[test]
    fn write_atomic_cleans_up_after_failed_rename() {
        let fs = MemoryFileSystem::new();
        fs.insert("/out/status.json", "old");
        fs.fail_renames(true);
        let ctx = ServiceContext::testing(fs.clone());

        assert!(write_atomic(&ctx, Path::new("/out/status.json"), "new").is_err());
        assert_eq!(fs.paths(), vec![PathBuf::from("/out/status.json")]);
        assert_eq!(fs.get("/out/status.json").as_deref(), Some("old"));
    }

    fn exercise(store: &mut StatusStore<'_>, g: &TaskGraph) {
        let mut session = store.open(g, LoadOptions::recover()).unwrap();
        session.start(g, "A", "w1").unwrap();
        session.commit().unwrap();

        let mut session = store.open(g, LoadOptions::reevaluate()).unwrap();
        session.complete(g, "A", CompletionReport::new(TaskResult::Done, "built")).unwrap();
        session.commit().unwrap();

        let mut session = store.open(g, LoadOptions::reevaluate()).unwrap();
        let mut report = CompletionReport::new(TaskResult::Blocked, "stuck");
        report.blockers = vec!["needs review".to_string()];
        session.complete(g, "C", report).unwrap();
        session.commit().unwrap();
    }

    #[test]
    fn file_and_sqlite_backends_agree() {
        let g = graph(&[("A", &[]), ("B", &["A"]), ("C", &["A"])]);

        let file_fs = MemoryFileSystem::new();
        let file_ctx = ServiceContext::testing(file_fs.clone());
        exercise(&mut file_store(&file_ctx), &g);

        let sqlite_fs = MemoryFileSystem::new();
        let sqlite_ctx = ServiceContext::testing(sqlite_fs.clone());
        let backend = SqliteBackend::in_memory(&sqlite_ctx, Path::new(STATUS)).unwrap();
        exercise(&mut StatusStore::new(&sqlite_ctx, Box::new(backend)), &g);

        let exported = file_fs.get(STATUS).unwrap();
        assert_eq!(exported, sqlite_fs.get(STATUS).unwrap());
        assert!(exported.contains("\"needs review\""));
    }
}
