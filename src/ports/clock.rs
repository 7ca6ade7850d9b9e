//! Clock port for obtaining the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Every timestamp written into a status record comes from here, so tests
/// can pin `started_at`/`finished_at`/`updated_at` to known values.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
