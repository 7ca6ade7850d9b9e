//! Filesystem port for file I/O operations.

use std::io;
use std::path::Path;

/// Provides the filesystem operations the status store needs.
///
/// The write-then-rename and exclusive-create primitives are what make
/// file-backed commits atomic and single-writer.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Creates a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if a component exists as a file or cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Creates a file that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`io::ErrorKind::AlreadyExists`] when the
    /// file is already present, or any other IO error.
    fn create_new(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Atomically replaces `to` with `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is missing or the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be removed.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}
