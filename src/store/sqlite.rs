//! Embedded SQLite backend.
//!
//! Every session runs inside `BEGIN IMMEDIATE` with a zero busy timeout, so
//! a second writer fails at once instead of queueing. Each commit also
//! exports the snapshot to `status.json` for plain-file readers. The export
//! is written while the transaction is still open, so a failed export rolls
//! the database back instead of leaving the two copies apart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::{render_document, write_atomic, StatusBackend, StatusTransaction};
use crate::context::ServiceContext;
use crate::errors::{Error, Result};
use crate::status::{SnapshotDocument, Summary};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS task_status (
    task_id TEXT PRIMARY KEY,
    state   TEXT NOT NULL,
    record  TEXT NOT NULL
);
";

/// Stores records in `status.db` and mirrors them to `status.json`.
pub struct SqliteBackend<'c> {
    ctx: &'c ServiceContext,
    conn: Connection,
    db_path: PathBuf,
    export_path: PathBuf,
}

impl<'c> SqliteBackend<'c> {
    /// Opens (creating if needed) the database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(ctx: &'c ServiceContext, db_path: &Path, export_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ctx.fs.create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(ctx, conn, db_path, export_path)
    }

    /// A backend over a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn in_memory(ctx: &'c ServiceContext, export_path: &Path) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(ctx, conn, Path::new(":memory:"), export_path)
    }

    fn with_connection(
        ctx: &'c ServiceContext,
        conn: Connection,
        db_path: &Path,
        export_path: &Path,
    ) -> Result<Self> {
        conn.busy_timeout(Duration::ZERO)?;
        Ok(Self {
            ctx,
            conn,
            db_path: db_path.to_path_buf(),
            export_path: export_path.to_path_buf(),
        })
    }
}

fn busy_or(err: rusqlite::Error, path: &Path) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            Error::StoreBusy { path: path.to_path_buf() }
        }
        other => Error::Sqlite(other),
    }
}

impl StatusBackend for SqliteBackend<'_> {
    fn begin(&mut self) -> Result<Box<dyn StatusTransaction + '_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| busy_or(e, &self.db_path))?;
        tx.execute_batch(SCHEMA)?;
        debug!(db = %self.db_path.display(), "sqlite transaction begun");

        Ok(Box::new(SqliteTransaction {
            ctx: self.ctx,
            tx,
            db_path: &self.db_path,
            export_path: &self.export_path,
        }))
    }

    fn location(&self) -> PathBuf {
        self.db_path.clone()
    }
}

struct SqliteTransaction<'a> {
    ctx: &'a ServiceContext,
    tx: rusqlite::Transaction<'a>,
    db_path: &'a Path,
    export_path: &'a Path,
}

impl SqliteTransaction<'_> {
    fn meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .tx
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptStore { path: self.db_path.to_path_buf(), reason }
    }
}

impl StatusTransaction for SqliteTransaction<'_> {
    fn read(&mut self) -> Result<Option<SnapshotDocument>> {
        let Some(project) = self.meta("project")? else {
            return Ok(None);
        };
        let schema_version = match self.meta("schema_version")? {
            Some(v) => v
                .parse::<u32>()
                .map_err(|e| self.corrupt(format!("schema_version '{v}': {e}")))?,
            None => return Err(self.corrupt("missing schema_version".to_string())),
        };
        let updated_at = match self.meta("updated_at")? {
            Some(v) => Some(
                DateTime::parse_from_rfc3339(&v)
                    .map_err(|e| self.corrupt(format!("updated_at '{v}': {e}")))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let rows: Vec<(String, String)> = {
            let mut stmt = self.tx.prepare("SELECT task_id, record FROM task_status")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        let mut tasks = BTreeMap::new();
        for (task_id, record) in rows {
            let value = serde_json::from_str(&record)
                .map_err(|e| self.corrupt(format!("record for task '{task_id}': {e}")))?;
            tasks.insert(task_id, value);
        }

        Ok(Some(SnapshotDocument {
            project,
            schema_version,
            updated_at,
            summary: Summary::default(),
            tasks,
        }))
    }

    fn commit(self: Box<Self>, document: &SnapshotDocument) -> Result<()> {
        let Self { ctx, tx, export_path, .. } = *self;

        tx.execute("DELETE FROM task_status", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO task_status (task_id, state, record) VALUES (?1, ?2, ?3)",
            )?;
            for (task_id, record) in &document.tasks {
                let state = record.get("state").and_then(|s| s.as_str()).unwrap_or_default();
                insert.execute(params![task_id, state, record.to_string()])?;
            }
        }

        let mut upsert =
            tx.prepare("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")?;
        upsert.execute(params!["project", document.project])?;
        upsert.execute(params!["schema_version", document.schema_version.to_string()])?;
        match document.updated_at {
            Some(at) => {
                upsert.execute(params!["updated_at", at.to_rfc3339()])?;
            }
            None => {
                tx.execute("DELETE FROM meta WHERE key = 'updated_at'", [])?;
            }
        }
        drop(upsert);

        write_atomic(ctx, export_path, &render_document(document)?)?;
        tx.commit()?;
        debug!(records = document.tasks.len(), "sqlite transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;

    fn document() -> SnapshotDocument {
        serde_json::from_str(
            r#"{"project": "demo", "schema_version": 3,
                "updated_at": "2026-03-01T12:00:00Z",
                "tasks": {"T1": {"state": "done", "attempts": 2}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_database_reads_as_none() {
        let ctx = ServiceContext::testing(MemoryFileSystem::new());
        let mut backend = SqliteBackend::in_memory(&ctx, Path::new("/plan/status.json")).unwrap();
        let mut tx = backend.begin().unwrap();
        assert_eq!(tx.read().unwrap(), None);
    }

    #[test]
    fn commit_round_trips_and_exports() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let mut backend = SqliteBackend::in_memory(&ctx, Path::new("/plan/status.json")).unwrap();

        backend.begin().unwrap().commit(&document()).unwrap();

        let mut tx = backend.begin().unwrap();
        assert_eq!(tx.read().unwrap(), Some(document()));
        let exported: SnapshotDocument =
            serde_json::from_str(&fs.get("/plan/status.json").unwrap()).unwrap();
        assert_eq!(exported, document());
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let mut backend = SqliteBackend::in_memory(&ctx, Path::new("/plan/status.json")).unwrap();

        {
            let tx = backend.begin().unwrap();
            drop(tx);
        }
        let mut tx = backend.begin().unwrap();
        assert_eq!(tx.read().unwrap(), None);
        assert_eq!(fs.get("/plan/status.json"), None);
    }

    #[test]
    fn failed_export_rolls_back_the_database() {
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());
        let mut backend = SqliteBackend::in_memory(&ctx, Path::new("/plan/status.json")).unwrap();
        backend.begin().unwrap().commit(&document()).unwrap();
        let exported_before = fs.get("/plan/status.json");

        let mut changed = document();
        changed.tasks.insert("T2".to_string(), serde_json::json!({"state": "todo"}));
        fs.fail_renames(true);
        assert!(matches!(backend.begin().unwrap().commit(&changed), Err(Error::Io { .. })));
        fs.fail_renames(false);

        let mut tx = backend.begin().unwrap();
        assert_eq!(tx.read().unwrap(), Some(document()));
        assert_eq!(fs.get("/plan/status.json"), exported_before);
    }

    #[test]
    fn open_creates_the_state_directory_through_the_context() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state").join("demo");
        let fs = MemoryFileSystem::new();
        let ctx = ServiceContext::testing(fs.clone());

        drop(SqliteBackend::open(&ctx, &state.join("status.db"), &state.join("status.json")));
        assert_eq!(fs.dirs(), vec![state.clone()]);
        assert!(!state.exists());

        let live = ServiceContext::live();
        SqliteBackend::open(&live, &state.join("status.db"), &state.join("status.json")).unwrap();
        assert!(state.join("status.db").exists());
    }

    #[test]
    fn second_connection_is_busy_while_first_holds_the_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("status.db");
        let export = dir.path().join("status.json");
        let ctx = ServiceContext::testing(MemoryFileSystem::new());
        let mut first = SqliteBackend::open(&ctx, &db, &export).unwrap();
        let mut second = SqliteBackend::open(&ctx, &db, &export).unwrap();

        let held = first.begin().unwrap();
        match second.begin().err() {
            Some(Error::StoreBusy { path }) => assert_eq!(path, db),
            other => panic!("expected StoreBusy, got {:?}", other.map(|e| e.to_string())),
        }
        drop(held);
        assert!(second.begin().is_ok());
    }

    #[test]
    fn malformed_record_is_corrupt() {
        let ctx = ServiceContext::testing(MemoryFileSystem::new());
        let mut backend = SqliteBackend::in_memory(&ctx, Path::new("/plan/status.json")).unwrap();
        backend.begin().unwrap().commit(&document()).unwrap();
        backend
            .conn
            .execute("UPDATE task_status SET record = '{oops' WHERE task_id = 'T1'", [])
            .unwrap();

        let mut tx = backend.begin().unwrap();
        match tx.read() {
            Err(Error::CorruptStore { reason, .. }) => assert!(reason.contains("'T1'"), "{reason}"),
            other => panic!("expected CorruptStore, got {:?}", other.map(|_| ())),
        }
    }
}
