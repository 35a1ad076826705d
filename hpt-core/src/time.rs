//! Monotonic time base for event tables
//!
//! All table timestamps and countdown periods are expressed in [`Ticks`]
//! of a fixed 1 MHz clock, the default embassy-time tick rate.

/// Tick rate of the sequencer time base in Hz
pub const TICK_HZ: u64 = 1_000_000;

const TICKS_PER_US: u64 = TICK_HZ / 1_000_000;
const TICKS_PER_MS: u64 = TICK_HZ / 1_000;

/// A duration in sequencer ticks
///
/// Used both for absolute event timestamps (time since table start) and
/// for countdown periods (delta between two timestamps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks(u64);

impl Ticks {
    /// Zero ticks (expire as soon as possible)
    pub const ZERO: Ticks = Ticks(0);

    /// Create from a raw tick count
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Create from microseconds
    pub const fn from_micros(us: u64) -> Self {
        Self(us * TICKS_PER_US)
    }

    /// Create from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * TICKS_PER_MS)
    }

    /// Create from microseconds, `None` if not representable
    pub const fn checked_from_micros(us: u64) -> Option<Self> {
        match us.checked_mul(TICKS_PER_US) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Create from milliseconds, `None` if not representable
    pub const fn checked_from_millis(ms: u64) -> Option<Self> {
        match ms.checked_mul(TICKS_PER_MS) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Raw tick count
    pub const fn as_ticks(self) -> u64 {
        self.0
    }

    /// Whole microseconds
    pub const fn as_micros(self) -> u64 {
        self.0 / TICKS_PER_US
    }

    /// Whole milliseconds (truncating)
    pub const fn as_millis(self) -> u64 {
        self.0 / TICKS_PER_MS
    }

    /// Subtract, returning `None` if `rhs` is later than `self`
    pub const fn checked_sub(self, rhs: Ticks) -> Option<Ticks> {
        match self.0.checked_sub(rhs.0) {
            Some(t) => Some(Ticks(t)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(Ticks::from_millis(1000).as_ticks(), 1_000_000);
        assert_eq!(Ticks::from_micros(250).as_ticks(), 250);
        assert_eq!(Ticks::from_millis(150).as_millis(), 150);
        assert_eq!(Ticks::from_ticks(1_500).as_millis(), 1);
        assert_eq!(Ticks::from_ticks(1_500).as_micros(), 1_500);
    }

    #[test]
    fn test_checked_conversions() {
        assert_eq!(Ticks::checked_from_millis(7), Some(Ticks::from_millis(7)));
        assert_eq!(Ticks::checked_from_micros(7), Some(Ticks::from_micros(7)));
        assert_eq!(Ticks::checked_from_millis(u64::MAX), None);
        assert_eq!(Ticks::from_ticks(u64::MAX).as_millis(), u64::MAX / 1_000);
    }

    #[test]
    fn test_checked_sub() {
        let a = Ticks::from_millis(150);
        let b = Ticks::from_millis(100);
        assert_eq!(a.checked_sub(b), Some(Ticks::from_millis(50)));
        assert_eq!(a.checked_sub(a), Some(Ticks::ZERO));
        assert_eq!(b.checked_sub(a), None);
    }
}
