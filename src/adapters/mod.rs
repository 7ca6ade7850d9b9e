//! Adapter implementations of the port traits.
//!
//! `live` talks to the real system; `memory` keeps everything in process.

pub mod live;
pub mod memory;
