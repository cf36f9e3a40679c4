use rand::{RngCore, TryRngCore, rngs::OsRng};

use crate::{RandSource, RandomSourceError};

/// A `RandSource` that reads directly from the operating system's CSPRNG
/// (`getrandom` under the hood).
///
/// Every refill is a syscall, which the random pool amortizes across many
/// IDs. A failing OS source is reported as a [`RandomSourceError`] rather than
/// substituted.
#[derive(Default, Clone, Copy, Debug)]
pub struct OsRandom;

impl RandSource for OsRandom {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| RandomSourceError::new(e.to_string()))
    }
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// This RNG is fast, cryptographically secure (ChaCha-based), and
/// automatically reseeded from the OS. It panics instead of erroring if the
/// initial OS seed cannot be read, so prefer [`OsRandom`] where that matters.
///
/// ⚠️ NOTE: The underlying `ThreadRng` is not `Send` or `Sync`. This type does
/// not store it; it accesses the thread-local generator on each call, so it
/// may be freely used across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        rand::rng().fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fills_distinct_buffers(mut source: impl RandSource) {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        source.try_fill(&mut a).unwrap();
        source.try_fill(&mut b).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, [0u8; 32]);
    }

    #[test]
    fn os_random_fills() {
        fills_distinct_buffers(OsRandom);
    }

    #[test]
    fn thread_random_fills() {
        fills_distinct_buffers(ThreadRandom);
    }
}
