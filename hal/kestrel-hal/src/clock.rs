//! Monotonic time source

/// Microsecond clock used for reception timeouts
///
/// Must never go backwards. Wrapping is not expected within the lifetime of a
/// session (a `u64` of microseconds lasts half a million years).
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin
    fn now_micros(&self) -> u64;
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_micros(&self) -> u64 {
        T::now_micros(self)
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl MonotonicClock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
