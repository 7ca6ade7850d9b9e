//! Live clock using the system clock.

use chrono::{DateTime, SubsecRound, Utc};

use crate::ports::clock::Clock;

/// Live clock returning the current time at whole-second precision, which
/// keeps status artifacts readable.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_current_time_without_fraction() {
        let before = Utc::now().trunc_subsecs(0);
        let now = LiveClock.now();
        let after = Utc::now();

        assert!(now >= before);
        assert!(now <= after);
        assert_eq!(now.timestamp_subsec_nanos(), 0);
    }
}
