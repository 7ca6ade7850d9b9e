//! In-memory adapters for tests and embedding.
//!
//! These keep every interaction in process so store and command behaviour
//! can be exercised without touching disk, git, or the wall clock.

mod filesystem;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

pub use filesystem::MemoryFileSystem;

use crate::ports::{Clock, GitRepo, IdGenerator};

/// Clock that returns a settable instant.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// A clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// ID generator yielding `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("id-{n}")
    }
}

/// Git repository stub reporting a fixed branch.
pub struct StaticGitRepo {
    branch: Option<String>,
}

impl StaticGitRepo {
    /// A repository checked out on `branch` (or detached when `None`).
    #[must_use]
    pub fn new(branch: Option<&str>) -> Self {
        Self { branch: branch.map(ToString::to_string) }
    }
}

impl GitRepo for StaticGitRepo {
    fn current_branch(&self) -> std::io::Result<Option<String>> {
        Ok(self.branch.clone())
    }
}
