use crate::RandomSourceError;

/// A trait for sources of cryptographically secure random bytes.
///
/// This abstraction allows you to plug in the operating-system RNG, a faster
/// userspace CSPRNG, or a mocked source in tests.
///
/// Implementations must either fill all of `dest` with fresh random bytes or
/// return an error; partially filled buffers are discarded by the caller.
///
/// # Example
/// ```
/// use esnowflake::{RandSource, RandomSourceError};
///
/// struct Unavailable;
/// impl RandSource for Unavailable {
///     fn try_fill(&mut self, _dest: &mut [u8]) -> Result<(), RandomSourceError> {
///         Err(RandomSourceError::new("entropy device missing"))
///     }
/// }
///
/// let mut buf = [0u8; 8];
/// assert!(Unavailable.try_fill(&mut buf).is_err());
/// ```
pub trait RandSource {
    /// Fills `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot produce randomness.
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError>;
}

impl<R: RandSource + ?Sized> RandSource for &mut R {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        (**self).try_fill(dest)
    }
}
