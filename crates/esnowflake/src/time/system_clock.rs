use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The operating system's wall clock.
///
/// Wall-clock time can jump in either direction (NTP slews, manual changes).
/// How a sequence generator reacts to a backward jump is controlled by
/// [`ClockPolicy`](crate::ClockPolicy).
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    /// A clock set before 1970 reads as `0`.
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
