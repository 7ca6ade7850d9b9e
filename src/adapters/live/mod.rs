//! Live adapters backed by the real system.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;

pub use clock::LiveClock;
pub use filesystem::LiveFileSystem;
pub use git::LiveGitRepo;
pub use id_gen::LiveIdGenerator;
