//! Live filesystem adapter using `std::fs`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => LiveFileSystem.create_dir_all(parent),
        _ => Ok(()),
    }
}

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        ensure_parent(path)?;
        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(contents.as_bytes())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.lock");

        LiveFileSystem.create_new(&path, "one").unwrap();
        let err = LiveFileSystem.create_new(&path, "two").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "one");
    }

    #[test]
    fn rename_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("status.json.tmp");
        let target = dir.path().join("status.json");
        LiveFileSystem.write(&target, "old").unwrap();
        LiveFileSystem.write(&tmp, "new").unwrap();

        LiveFileSystem.rename(&tmp, &target).unwrap();
        assert_eq!(LiveFileSystem.read_to_string(&target).unwrap(), "new");
        assert!(!LiveFileSystem.exists(&tmp));
    }
}
