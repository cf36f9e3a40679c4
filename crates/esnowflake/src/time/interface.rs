/// A trait for time sources that return the current wall-clock time.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests.
///
/// The unit is **milliseconds since the Unix epoch**. Generators subtract
/// [`EPOCH_MS`] themselves, so decoded IDs can be mapped back to calendar
/// time.
///
/// [`EPOCH_MS`]: crate::EPOCH_MS
///
/// # Example
///
/// ```
/// use esnowflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
