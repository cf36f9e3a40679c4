use thiserror::Error as ThisError;

/// Result alias used throughout `esnowflake`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `esnowflake` can emit.
///
/// Construction and randomness failures are surfaced as values rather than
/// panics so callers can decide whether to retry or terminate. A generator
/// that returned an error is still usable: the lock is released and the
/// random pool stays exhausted until a refill succeeds.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// The worker address did not parse as IPv4 (or IPv4-mapped IPv6).
    #[error("invalid IPv4 address: {input:?}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
    },

    /// The secure random source could not fill the pool.
    #[error(transparent)]
    RandomSource(#[from] RandomSourceError),

    /// An encoded identifier could not be decoded.
    #[error("invalid identifier: {0}")]
    Decode(#[from] DecodeError),

    /// The clock reported a time earlier than the last issued timestamp and
    /// the generator was configured with [`ClockPolicy::Reject`].
    ///
    /// [`ClockPolicy::Reject`]: crate::ClockPolicy::Reject
    #[error("clock moved backwards: last issued at {last_ms} ms, now {now_ms} ms")]
    ClockMovedBackwards {
        /// Unix milliseconds of the last issued sequence ID.
        last_ms: u64,
        /// Unix milliseconds reported by the clock.
        now_ms: u64,
    },

    /// The operation failed because the generator lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

/// The secure random source failed to produce bytes.
///
/// There is no fallback source: the uniqueness guarantee of the random tail
/// depends on this randomness.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("secure random source failed: {reason}")]
pub struct RandomSourceError {
    reason: String,
}

impl RandomSourceError {
    /// Creates an error carrying the source's failure message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The failure message reported by the source.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Reasons an encoded identifier is rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[non_exhaustive]
pub enum DecodeError {
    /// The text is not 22 characters, or does not decode to 16 bytes.
    #[error("invalid length: {len}")]
    InvalidLength {
        /// Length of the offending input (characters or decoded bytes).
        len: usize,
    },

    /// The text is not unpadded URL-safe base64.
    #[error("invalid base64: {reason}")]
    InvalidBase64 {
        /// Message from the base64 decoder.
        reason: String,
    },

    /// The embedded timestamp cannot be represented as a calendar time.
    #[error("timestamp out of range: {millis} ms")]
    TimestampOutOfRange {
        /// The decoded Unix milliseconds.
        millis: i64,
    },
}

#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
