//! Live git adapter using the `git` CLI.

use std::process::Command;

use crate::ports::git::GitRepo;

/// Live git adapter that shells out to the `git` CLI.
pub struct LiveGitRepo;

impl GitRepo for LiveGitRepo {
    fn current_branch(&self) -> std::io::Result<Option<String>> {
        let output = Command::new("git").args(["rev-parse", "--abbrev-ref", "HEAD"]).output()?;
        if !output.status.success() {
            // Not a repository, or no commits yet.
            return Ok(None);
        }
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if branch.is_empty() || branch == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(branch))
        }
    }
}
