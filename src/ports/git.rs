//! Git repository port, used to derive the plan slug.

/// Provides read access to the surrounding git checkout.
pub trait GitRepo: Send + Sync {
    /// Returns the checked-out branch name.
    ///
    /// `Ok(None)` means there is no branch to use: not a repository, or a
    /// detached HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if git itself could not be run.
    fn current_branch(&self) -> std::io::Result<Option<String>>;
}
