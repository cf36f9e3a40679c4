use core::num::NonZeroUsize;

/// Random-pool chunks drawn per refill unless configured otherwise.
pub const DEFAULT_POOL_CHUNKS: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// What a sequence generator does when the clock reads earlier than the last
/// issued timestamp.
///
/// Pure-random IDs never consult the policy: they carry no ordering guarantee
/// and are always issued at the current clock reading. They share the
/// generator's lock, though, so under [`Stall`](ClockPolicy::Stall) a random
/// call made during the stall waits until the sequence call releases it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockPolicy {
    /// Reset the sequence to zero and issue at the earlier time.
    ///
    /// IDs issued after the jump may sort before earlier ones, and an
    /// `(timestamp, sequence)` pair already used in the repeated millisecond
    /// can be issued again; the random bytes in the tail are then the only
    /// thing keeping the IDs apart.
    #[default]
    Accept,
    /// Block until the clock catches up with the last issued timestamp, then
    /// continue as if no jump happened. Preserves strict ordering at the cost
    /// of latency proportional to the jump.
    Stall,
    /// Fail the call with [`Error::ClockMovedBackwards`] and leave the
    /// generator state untouched.
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    Reject,
}

/// Tunables for a [`Generator`](crate::Generator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// IDs served per random-pool refill. Each generator owns two pools (8
    /// bytes per random-tail ID, 6 bytes per sequence-tail ID), each holding
    /// this many chunks, clamped to [`MAX_POOL_CHUNKS`](crate::MAX_POOL_CHUNKS).
    pub pool_chunks: NonZeroUsize,
    /// Reaction to a backward clock in the sequence variant.
    pub clock_policy: ClockPolicy,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            pool_chunks: DEFAULT_POOL_CHUNKS,
            clock_policy: ClockPolicy::default(),
        }
    }
}

impl GeneratorOptions {
    /// Sets the number of IDs served per pool refill.
    #[must_use]
    pub fn with_pool_chunks(mut self, pool_chunks: NonZeroUsize) -> Self {
        self.pool_chunks = pool_chunks;
        self
    }

    /// Sets the backward-clock policy.
    #[must_use]
    pub fn with_clock_policy(mut self, clock_policy: ClockPolicy) -> Self {
        self.clock_policy = clock_policy;
        self
    }
}
