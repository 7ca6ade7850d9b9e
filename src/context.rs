//! Service context bundling all port trait objects.

use chrono::{DateTime, Utc};

use crate::adapters::live::{LiveClock, LiveFileSystem, LiveGitRepo, LiveIdGenerator};
use crate::adapters::memory::{FixedClock, MemoryFileSystem, SequentialIdGenerator, StaticGitRepo};
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::git::GitRepo;
use crate::ports::id_gen::IdGenerator;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live or in-memory).
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// Git repository for branch lookups.
    pub git: Box<dyn GitRepo>,
    /// ID generator for temp-file and lock tokens.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a live context with real adapters.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            git: Box::new(LiveGitRepo),
            id_gen: Box::new(LiveIdGenerator),
        }
    }

    /// Creates a deterministic context over an in-memory filesystem.
    ///
    /// The clock is frozen at [`ServiceContext::testing_epoch`], IDs count up
    /// from `id-1`, and git reports no branch.
    #[must_use]
    pub fn testing(fs: MemoryFileSystem) -> Self {
        Self {
            clock: Box::new(FixedClock::new(Self::testing_epoch())),
            fs: Box::new(fs),
            git: Box::new(StaticGitRepo::new(None)),
            id_gen: Box::new(SequentialIdGenerator::default()),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the git repository.
    #[must_use]
    pub fn with_git(mut self, git: impl GitRepo + 'static) -> Self {
        self.git = Box::new(git);
        self
    }

    /// Instant the testing clock is frozen at: 2026-03-01T12:00:00Z.
    #[must_use]
    pub fn testing_epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_772_366_400, 0).unwrap_or_default()
    }
}
