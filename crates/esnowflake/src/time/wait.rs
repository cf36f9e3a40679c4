use core::time::Duration;

use crate::TimeSource;

/// Clock polls spent in a busy spin before falling back to yielding the
/// thread.
pub const SPIN_POLLS: u32 = 64;

/// Blocks until `time` reports at least `target_ms`, and returns that reading.
///
/// The wait has three phases, chosen by the remaining gap:
///
/// - 2 ms or more: sleep for the gap minus one millisecond, then re-read
/// - under 1 ms: busy-spin ([`core::hint::spin_loop`]) for up to
///   [`SPIN_POLLS`] reads
/// - still not there: [`std::thread::yield_now`] between reads
///
/// There is no timeout and the wait cannot be cancelled. With a forward
/// moving clock it returns within one clock tick of `target_ms`; a clock
/// that never reaches the target blocks forever.
///
/// # Example
///
/// ```
/// use esnowflake::{SystemClock, TimeSource, wait_until};
///
/// let now = SystemClock.current_millis();
/// let later = wait_until(&SystemClock, now + 1);
/// assert!(later > now);
/// ```
pub fn wait_until<T>(time: &T, target_ms: u64) -> u64
where
    T: TimeSource + ?Sized,
{
    let mut polls = 0;
    loop {
        let now = time.current_millis();
        if now >= target_ms {
            return now;
        }
        let gap = target_ms - now;
        if gap > 1 {
            std::thread::sleep(Duration::from_millis(gap - 1));
        } else if polls < SPIN_POLLS {
            polls += 1;
            core::hint::spin_loop();
        } else {
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct StepTime {
        values: Vec<u64>,
        reads: AtomicUsize,
    }

    impl StepTime {
        fn new(values: Vec<u64>) -> Self {
            Self {
                values,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl TimeSource for StepTime {
        fn current_millis(&self) -> u64 {
            let i = self.reads.fetch_add(1, Ordering::Relaxed);
            self.values[i.min(self.values.len() - 1)]
        }
    }

    #[test]
    fn returns_immediately_when_already_past() {
        let time = StepTime::new(vec![10]);
        assert_eq!(wait_until(&time, 7), 10);
        assert_eq!(time.reads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn polls_until_target_reached() {
        let mut values = vec![41; 200];
        values.push(42);
        let time = StepTime::new(values);
        assert_eq!(wait_until(&time, 42), 42);
        assert_eq!(time.reads.load(Ordering::Relaxed), 201);
    }

    #[test]
    fn sleeps_across_large_gaps() {
        let time = StepTime::new(vec![0, 5]);
        let start = Instant::now();
        assert_eq!(wait_until(&time, 5), 5);
        assert!(start.elapsed() >= Duration::from_millis(4));
    }
}
