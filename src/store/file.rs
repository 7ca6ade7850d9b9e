//! Flat JSON file backend.
//!
//! Exclusivity comes from creating `status.lock` with create-new semantics;
//! the snapshot itself is replaced with write-then-rename at commit.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{render_document, write_atomic, StatusBackend, StatusTransaction};
use crate::context::ServiceContext;
use crate::errors::{Error, Result};
use crate::status::SnapshotDocument;

/// Stores the snapshot as `status.json` inside a plan directory.
pub struct FileBackend<'c> {
    ctx: &'c ServiceContext,
    status_path: PathBuf,
    lock_path: PathBuf,
}

impl<'c> FileBackend<'c> {
    /// A backend rooted at `plan_dir`.
    #[must_use]
    pub fn new(ctx: &'c ServiceContext, plan_dir: &Path) -> Self {
        Self {
            ctx,
            status_path: plan_dir.join("status.json"),
            lock_path: plan_dir.join("status.lock"),
        }
    }
}

impl StatusBackend for FileBackend<'_> {
    fn begin(&mut self) -> Result<Box<dyn StatusTransaction + '_>> {
        let token = self.ctx.id_gen.generate_id();
        match self.ctx.fs.create_new(&self.lock_path, &token) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::StoreBusy { path: self.lock_path.clone() });
            }
            Err(e) => return Err(Error::io(&self.lock_path, e)),
        }
        debug!(lock = %self.lock_path.display(), %token, "status lock acquired");

        Ok(Box::new(FileTransaction {
            ctx: self.ctx,
            status_path: &self.status_path,
            lock_path: &self.lock_path,
            released: false,
        }))
    }

    fn location(&self) -> PathBuf {
        self.status_path.clone()
    }
}

struct FileTransaction<'a> {
    ctx: &'a ServiceContext,
    status_path: &'a Path,
    lock_path: &'a Path,
    released: bool,
}

impl FileTransaction<'_> {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.ctx.fs.remove_file(self.lock_path) {
            debug!(lock = %self.lock_path.display(), error = %e, "could not remove status lock");
        }
    }
}

impl StatusTransaction for FileTransaction<'_> {
    fn read(&mut self) -> Result<Option<SnapshotDocument>> {
        if !self.ctx.fs.exists(self.status_path) {
            return Ok(None);
        }
        let text =
            self.ctx.fs.read_to_string(self.status_path).map_err(|e| Error::io(self.status_path, e))?;
        let document = serde_json::from_str(&text).map_err(|e| Error::CorruptStore {
            path: self.status_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Some(document))
    }

    fn commit(mut self: Box<Self>, document: &SnapshotDocument) -> Result<()> {
        let text = render_document(document)?;
        write_atomic(self.ctx, self.status_path, &text)?;
        self.release();
        Ok(())
    }
}

impl Drop for FileTransaction<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
