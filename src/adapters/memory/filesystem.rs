//! In-memory filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::filesystem::FileSystem;

/// Filesystem held in a shared map. Clones see the same files.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    dirs: Arc<Mutex<BTreeSet<PathBuf>>>,
    fail_renames: Arc<AtomicBool>,
}

impl MemoryFileSystem {
    /// An empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: &str) {
        self.lock().insert(path.into(), contents.to_string());
    }

    /// Returns a file's contents, if present.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// All paths currently present.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    /// Directories created explicitly through [`FileSystem::create_dir_all`].
    #[must_use]
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }

    /// Makes every subsequent rename fail, to simulate a crash mid-commit.
    pub fn fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("file not found: {}", path.display()))
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.lock().get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.lock().contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("not a directory: {}", path.display()),
            ));
        }
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner).insert(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.lock();
        files.contains_key(path)
            || files.keys().any(|k| k.starts_with(path))
            || self.dirs().iter().any(|d| d.starts_with(path))
    }

    fn create_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut files = self.lock();
        if files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", path.display()),
            ));
        }
        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(io::Error::other("rename disabled"));
        }
        let mut files = self.lock();
        let contents = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.lock().remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }
}
