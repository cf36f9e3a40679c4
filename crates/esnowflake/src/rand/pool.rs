use core::num::NonZeroUsize;

#[cfg(feature = "tracing")]
use tracing::{error, trace};

use crate::{RandSource, RandomSourceError};

/// Upper bound on chunks per fill. Larger requests are clamped, keeping a
/// pool's buffer at a few MiB at most.
pub const MAX_POOL_CHUNKS: NonZeroUsize = NonZeroUsize::new(1 << 20).unwrap();

/// A buffered supply of secure random bytes, consumed in fixed-size chunks.
///
/// The pool holds `unit * chunks` bytes, with `chunks` clamped to
/// [`MAX_POOL_CHUNKS`]. Each [`take`] hands out the next
/// `unit` bytes; when fewer than `unit` unconsumed bytes remain, the whole
/// buffer is refilled from the source and the cursor reset. Capacity is
/// always a multiple of the unit, so no bytes are stranded at the refill
/// boundary.
///
/// The pool starts exhausted: constructing one never touches the source, and
/// the first [`take`] performs the first fill.
///
/// [`take`]: RandomPool::take
///
/// # Example
///
/// ```
/// use core::num::NonZeroUsize;
/// use esnowflake::{OsRandom, RandomPool};
///
/// let mut pool = RandomPool::new(
///     OsRandom,
///     NonZeroUsize::new(8).unwrap(),
///     NonZeroUsize::new(4).unwrap(),
/// );
/// assert_eq!(pool.capacity(), 32);
///
/// let chunk = pool.take().unwrap();
/// assert_eq!(chunk.len(), 8);
/// assert_eq!(pool.remaining(), 24);
/// assert_eq!(pool.refills(), 1);
/// ```
#[derive(Debug)]
pub struct RandomPool<R> {
    buf: Box<[u8]>,
    cursor: usize,
    unit: usize,
    refills: u64,
    source: R,
}

impl<R> RandomPool<R>
where
    R: RandSource,
{
    /// Creates an exhausted pool serving `unit`-byte chunks, `chunks` per
    /// fill.
    pub fn new(source: R, unit: NonZeroUsize, chunks: NonZeroUsize) -> Self {
        let chunks = chunks.min(MAX_POOL_CHUNKS);
        let capacity = unit.saturating_mul(chunks).get();
        // Only a unit beyond any ID tail saturates; keep whole chunks anyway.
        let capacity = capacity - capacity % unit.get();
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            cursor: capacity,
            unit: unit.get(),
            refills: 0,
            source,
        }
    }

    /// Returns the next `unit` unconsumed bytes, refilling first if needed.
    ///
    /// # Errors
    ///
    /// Returns the source's error if a refill fails. The pool is then left
    /// exhausted, so the next call retries the refill instead of serving
    /// stale or partially written bytes.
    pub fn take(&mut self) -> Result<&[u8], RandomSourceError> {
        if self.cursor + self.unit > self.buf.len() {
            self.refill()?;
        }
        let start = self.cursor;
        self.cursor += self.unit;
        Ok(&self.buf[start..self.cursor])
    }

    fn refill(&mut self) -> Result<(), RandomSourceError> {
        // Mark exhausted before touching the buffer in case the fill fails
        // halfway.
        self.cursor = self.buf.len();
        match self.source.try_fill(&mut self.buf) {
            Ok(()) => {
                self.cursor = 0;
                self.refills += 1;
                #[cfg(feature = "tracing")]
                trace!(capacity = self.buf.len(), refills = self.refills, "random pool refilled");
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!(error = %e, "random pool refill failed");
                Err(e)
            }
        }
    }

    /// Total bytes per fill.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes handed out per [`take`](RandomPool::take).
    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Unconsumed bytes left in the current fill.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Number of successful fills since construction.
    pub fn refills(&self) -> u64 {
        self.refills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Fills with a running counter so every byte position across fills is
    /// distinguishable.
    struct CountingRandom {
        next: u8,
        fills: usize,
    }

    impl RandSource for CountingRandom {
        fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
            self.fills += 1;
            for b in dest {
                *b = self.next;
                self.next = self.next.wrapping_add(1);
            }
            Ok(())
        }
    }

    struct FailingRandom {
        fail: bool,
    }

    impl RandSource for FailingRandom {
        fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
            if self.fail {
                dest[0] = 0xEE;
                return Err(RandomSourceError::new("no entropy"));
            }
            dest.fill(0x11);
            Ok(())
        }
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn counting_pool(unit: usize, chunks: usize) -> RandomPool<CountingRandom> {
        RandomPool::new(CountingRandom { next: 0, fills: 0 }, nz(unit), nz(chunks))
    }

    #[test]
    fn construction_does_not_fill() {
        let pool = counting_pool(8, 4);
        assert_eq!(pool.capacity(), 32);
        assert_eq!(pool.remaining(), 0);
        assert_eq!(pool.refills(), 0);
        assert_eq!(pool.source.fills, 0);
    }

    #[test]
    fn oversized_chunk_count_is_clamped() {
        let mut pool = counting_pool(8, usize::MAX / 4);
        assert_eq!(pool.capacity(), 8 * MAX_POOL_CHUNKS.get());
        assert_eq!(pool.capacity() % pool.unit(), 0);
        assert_eq!(pool.take().unwrap().len(), 8);
        assert_eq!(pool.remaining(), pool.capacity() - 8);
    }

    #[test]
    fn refills_exactly_once_per_cycle() {
        let mut pool = counting_pool(6, 8);
        let per_fill = pool.capacity() / pool.unit();

        for cycle in 1..=3u64 {
            for _ in 0..per_fill {
                pool.take().unwrap();
                assert_eq!(pool.refills(), cycle);
            }
            assert_eq!(pool.remaining(), 0);
        }
        assert_eq!(pool.source.fills, 3);

        pool.take().unwrap();
        assert_eq!(pool.refills(), 4);
        assert_eq!(pool.remaining(), pool.capacity() - pool.unit());
    }

    #[test]
    fn chunks_never_repeat_within_a_fill() {
        let mut pool = counting_pool(8, 16);
        let mut seen = HashSet::new();
        for _ in 0..16 {
            let chunk = pool.take().unwrap().to_vec();
            assert_eq!(chunk.len(), 8);
            assert!(seen.insert(chunk));
        }
        // The next fill continues the counter, so its chunks differ too.
        let chunk = pool.take().unwrap().to_vec();
        assert!(seen.insert(chunk));
        assert_eq!(pool.refills(), 2);
    }

    #[test]
    fn serves_consecutive_slices() {
        let mut pool = counting_pool(4, 2);
        assert_eq!(pool.take().unwrap(), &[0, 1, 2, 3]);
        assert_eq!(pool.take().unwrap(), &[4, 5, 6, 7]);
        assert_eq!(pool.take().unwrap(), &[8, 9, 10, 11]);
    }

    #[test]
    fn failed_refill_leaves_pool_exhausted() {
        let mut pool = RandomPool::new(FailingRandom { fail: true }, nz(8), nz(2));
        assert_eq!(
            pool.take().unwrap_err(),
            RandomSourceError::new("no entropy")
        );
        assert_eq!(pool.remaining(), 0);
        assert_eq!(pool.refills(), 0);

        // A retry after the source recovers never serves the partial write.
        pool.source.fail = false;
        assert_eq!(pool.take().unwrap(), &[0x11; 8]);
        assert_eq!(pool.refills(), 1);
    }
}
