//! Port traits defining external boundaries.
//!
//! Each trait is one boundary between the orchestration core and the
//! outside world (time, filesystem, git, unique IDs). Implementations live
//! in `src/adapters/`: `live` for real use, `memory` for tests.

pub mod clock;
pub mod filesystem;
pub mod git;
pub mod id_gen;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use git::GitRepo;
pub use id_gen::IdGenerator;
