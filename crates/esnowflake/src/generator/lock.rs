use core::fmt;
use std::sync::Arc;

use chrono::TimeZone;
#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::{
    ClockPolicy, Error, GeneratorOptions, OsRandom, RANDOM_TAIL_LEN, RandSource, RawId, Result,
    SEQUENCE_RANDOM_LEN, SystemClock, TimeSource, WorkerIdentity,
    generator::{GenerationState, Mutex, MutexGuard},
    wait_until,
};

/// Format used by [`Generator::get_time`]: `YYYY-MM-DD HH:MM:SS`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A lock-based ID generator bound to one worker identity.
///
/// Each call takes a single lock covering the sequence state and both random
/// pools, reads the clock inside it, and releases it on every exit path.
/// Clones share the same state, so a generator can be handed to many threads
/// directly or through an [`Arc`].
///
/// Two variants are offered:
///
/// - [`generate_by_random`]: 40-bit timestamp, 24-bit worker, 64 random bits.
///   No ordering between calls.
/// - [`generate_by_sequence`]: 40-bit timestamp, 24-bit worker, 48 random
///   bits and a 16-bit per-millisecond counter. Within one generator no two
///   calls share a `(timestamp, sequence)` pair while the clock moves
///   forward.
///
/// [`generate_by_random`]: Generator::generate_by_random
/// [`generate_by_sequence`]: Generator::generate_by_sequence
///
/// # Example
///
/// ```
/// use esnowflake::Generator;
///
/// let generator = Generator::new("192.168.1.2", 1, 2, 3)?;
///
/// let id = generator.generate_by_sequence()?;
/// assert_eq!(id.len(), 22);
/// assert_eq!(generator.get_ip(&id)?, "xxx.168.1.2");
/// # Ok::<(), esnowflake::Error>(())
/// ```
pub struct Generator<R = OsRandom, T = SystemClock> {
    identity: WorkerIdentity,
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<GenerationState<R>>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<GenerationState<R>>>,
    time: T,
    clock_policy: ClockPolicy,
}

impl Generator {
    /// Creates a generator for the worker at `ip`, using the OS random source
    /// and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `ip` is not a valid IPv4 address.
    pub fn new(ip: &str, mask1: u8, mask2: u8, mask3: u8) -> Result<Self> {
        let identity = WorkerIdentity::new(ip, mask1, mask2, mask3)?;
        Ok(Self::with_sources(identity, OsRandom, SystemClock))
    }
}

impl<R, T> Generator<R, T>
where
    R: RandSource + Clone,
    T: TimeSource,
{
    /// Creates a generator with explicit random and time sources and default
    /// options.
    pub fn with_sources(identity: WorkerIdentity, rand: R, time: T) -> Self {
        Self::with_options(identity, rand, time, GeneratorOptions::default())
    }

    /// Creates a generator with explicit sources and options.
    pub fn with_options(
        identity: WorkerIdentity,
        rand: R,
        time: T,
        options: GeneratorOptions,
    ) -> Self {
        Self::from_components(identity, 0, 0, rand, time, options)
    }

    /// Creates a generator from explicit sequence state.
    ///
    /// This constructor is primarily useful for advanced use cases such as
    /// restoring state after a restart or forcing the sequence counter in
    /// tests.
    ///
    /// # Parameters
    /// - `last_ms`: Unix milliseconds of the last issued sequence ID
    /// - `sequence`: The sequence value issued at `last_ms`
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`Self::with_sources`] and let
    /// the generator start from a clean state.
    pub fn from_components(
        identity: WorkerIdentity,
        last_ms: u64,
        sequence: u16,
        rand: R,
        time: T,
        options: GeneratorOptions,
    ) -> Self {
        let state = Mutex::new(GenerationState::new(
            last_ms,
            sequence,
            rand,
            options.pool_chunks,
        ));
        Self {
            identity,
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
            time,
            clock_policy: options.clock_policy,
        }
    }
}

impl<R, T> Generator<R, T>
where
    R: RandSource,
    T: TimeSource,
{
    /// The worker identity embedded in every ID.
    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    /// The configured backward-clock policy.
    pub fn clock_policy(&self) -> ClockPolicy {
        self.clock_policy
    }

    pub(crate) fn lock_state(&self) -> Result<MutexGuard<'_, GenerationState<R>>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    /// Generates an ID with a 64-bit random tail.
    ///
    /// # Errors
    ///
    /// - [`Error::RandomSource`] if the pool needed a refill and the source
    ///   failed
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   lock (std mutex only)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_random_id(&self) -> Result<RawId> {
        let mut state = self.lock_state()?;
        let now = self.time.current_millis();
        let mut random = [0; RANDOM_TAIL_LEN];
        random.copy_from_slice(state.random_pool.take()?);
        Ok(RawId::with_random_tail(now, self.identity.masked(), &random))
    }

    /// Generates an ID with a 48-bit random tail and a 16-bit sequence.
    ///
    /// Within the same millisecond the sequence increments by one. When it
    /// wraps to zero the call blocks (see [`wait_until`]) until the clock
    /// moves past the exhausted millisecond, holding the lock meanwhile.
    ///
    /// # Errors
    ///
    /// - [`Error::RandomSource`] if the pool needed a refill and the source
    ///   failed
    /// - [`Error::ClockMovedBackwards`] under [`ClockPolicy::Reject`]
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   lock (std mutex only)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_sequence_id(&self) -> Result<RawId> {
        let mut state = self.lock_state()?;
        let now = self.advance_sequence(&mut state)?;
        let mut random = [0; SEQUENCE_RANDOM_LEN];
        random.copy_from_slice(state.sequence_pool.take()?);
        Ok(RawId::with_sequence_tail(
            now,
            self.identity.masked(),
            &random,
            state.sequence,
        ))
    }

    /// Generates an ID with a random tail, encoded as 22-char base64.
    ///
    /// # Errors
    ///
    /// See [`Generator::next_random_id`].
    pub fn generate_by_random(&self) -> Result<String> {
        self.next_random_id().map(|id| id.encode())
    }

    /// Generates an ID with a sequence tail, encoded as 22-char base64.
    ///
    /// # Errors
    ///
    /// See [`Generator::next_sequence_id`].
    pub fn generate_by_sequence(&self) -> Result<String> {
        self.next_sequence_id().map(|id| id.encode())
    }

    /// Moves the sequence state to the current millisecond and returns it.
    ///
    /// The state is only written once the call is certain to issue an ID, so
    /// a rejected backward clock leaves it untouched.
    fn advance_sequence(&self, state: &mut GenerationState<R>) -> Result<u64> {
        let mut now = self.time.current_millis();
        if now < state.last_ms {
            now = self.cold_clock_behind(now, state.last_ms)?;
        }

        if now == state.last_ms {
            state.sequence = state.sequence.wrapping_add(1);
            if state.sequence == 0 {
                #[cfg(feature = "tracing")]
                debug!(last_ms = state.last_ms, "sequence exhausted, waiting for next millisecond");
                now = wait_until(&self.time, state.last_ms + 1);
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;
        Ok(now)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, last_ms: u64) -> Result<u64> {
        #[cfg(feature = "tracing")]
        warn!(last_ms, now, policy = ?self.clock_policy, "clock moved backwards");
        match self.clock_policy {
            ClockPolicy::Accept => Ok(now),
            ClockPolicy::Stall => Ok(wait_until(&self.time, last_ms)),
            ClockPolicy::Reject => Err(Error::ClockMovedBackwards {
                last_ms,
                now_ms: now,
            }),
        }
    }

    /// Decodes an ID string into its raw record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `id` is not a 22-char URL-safe base64
    /// string.
    pub fn decode(&self, id: &str) -> Result<RawId> {
        Ok(RawId::decode(id)?)
    }

    /// Returns the generation time of `id` as `YYYY-MM-DD HH:MM:SS` in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `id` is malformed.
    pub fn get_time(&self, id: &str) -> Result<String> {
        self.get_time_in(id, &chrono::Utc)
    }

    /// Returns the generation time of `id` as `YYYY-MM-DD HH:MM:SS` in the
    /// given time zone (e.g. `chrono::Local`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `id` is malformed.
    pub fn get_time_in<Tz>(&self, id: &str, tz: &Tz) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let datetime = self.decode(id)?.datetime()?;
        Ok(datetime.with_timezone(tz).format(TIME_FORMAT).to_string())
    }

    /// Returns the worker address fragment of `id` as `xxx.B.C.D`.
    ///
    /// Only IDs issued under this generator's mask triple decode to the real
    /// octets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `id` is malformed.
    pub fn get_ip(&self, id: &str) -> Result<String> {
        Ok(self.identity.reveal(&self.decode(id)?))
    }
}

impl<R, T> Clone for Generator<R, T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            state: Arc::clone(&self.state),
            time: self.time.clone(),
            clock_policy: self.clock_policy,
        }
    }
}

impl<R, T> fmt::Debug for Generator<R, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("identity", &self.identity)
            .field("time", &self.time)
            .field("clock_policy", &self.clock_policy)
            .finish_non_exhaustive()
    }
}
