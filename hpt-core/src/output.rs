//! Output bank over `embedded-hal` pins
//!
//! Maps [`LineId`]s to physical pins so event tables never name a pin
//! directly. Each line can be active-low (line "high" drives the pin low).

use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::table::LineId;
use crate::traits::DigitalOutput;

/// Errors when registering output lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Line id already registered
    DuplicateLine(LineId),
    /// Bank capacity exhausted
    Full,
}

struct OutputLine<P> {
    id: LineId,
    pin: P,
    /// If true, line high = pin LOW
    active_low: bool,
    /// Current logical state
    high: bool,
}

impl<P: OutputPin> OutputLine<P> {
    fn drive(&mut self, high: bool) {
        self.high = high;

        // Normal: high=true, active_low=false -> pin high
        // Inverted: high=true, active_low=true -> pin low
        let result = if high != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        if result.is_err() {
            warn!("Output line {} failed to switch", self.id.0);
        }
    }
}

/// Fixed-capacity bank of output lines
pub struct OutputLines<P, const N: usize> {
    lines: Vec<OutputLine<P>, N>,
}

impl<P: OutputPin, const N: usize> OutputLines<P, N> {
    /// Create an empty bank
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Register a pin as line `id` and drive it to its initial state
    pub fn add(
        &mut self,
        id: LineId,
        pin: P,
        active_low: bool,
        initial_high: bool,
    ) -> Result<(), OutputError> {
        if self.lines.iter().any(|l| l.id == id) {
            return Err(OutputError::DuplicateLine(id));
        }
        if self.lines.is_full() {
            return Err(OutputError::Full);
        }

        let mut line = OutputLine {
            id,
            pin,
            active_low,
            high: initial_high,
        };
        line.drive(initial_high);

        self.lines.push(line).map_err(|_| OutputError::Full)
    }

    /// Logical state of a line, if registered
    pub fn is_set_high(&self, id: LineId) -> Option<bool> {
        self.lines.iter().find(|l| l.id == id).map(|l| l.high)
    }

    /// Number of registered lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn drive(&mut self, id: LineId, high: bool) {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => line.drive(high),
            None => warn!("Output line {} not configured", id.0),
        }
    }
}

impl<P: OutputPin, const N: usize> Default for OutputLines<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, const N: usize> DigitalOutput for OutputLines<P, N> {
    fn set_high(&mut self, line: LineId) {
        self.drive(line, true);
    }

    fn set_low(&mut self, line: LineId) {
        self.drive(line, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Mock GPIO pin sharing its level with the test
    struct MockPin<'a> {
        level: &'a Cell<bool>,
    }

    impl ErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for MockPin<'_> {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.level.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.level.set(true);
            Ok(())
        }
    }

    #[test]
    fn test_active_high_line() {
        let level = Cell::new(true);
        let mut bank: OutputLines<MockPin, 4> = OutputLines::new();
        bank.add(LineId(0), MockPin { level: &level }, false, false).unwrap();

        // Driven to initial state on registration
        assert!(!level.get());
        assert_eq!(bank.is_set_high(LineId(0)), Some(false));

        bank.set_high(LineId(0));
        assert!(level.get());
        assert_eq!(bank.is_set_high(LineId(0)), Some(true));

        bank.set_low(LineId(0));
        assert!(!level.get());
    }

    #[test]
    fn test_active_low_line() {
        let level = Cell::new(false);
        let mut bank: OutputLines<MockPin, 4> = OutputLines::new();
        bank.add(LineId(1), MockPin { level: &level }, true, false).unwrap();

        // Logical low is a high pin for active-low lines
        assert!(level.get());

        bank.set_high(LineId(1));
        assert!(!level.get());
        assert_eq!(bank.is_set_high(LineId(1)), Some(true));
    }

    #[test]
    fn test_unknown_line_ignored() {
        let level = Cell::new(false);
        let mut bank: OutputLines<MockPin, 4> = OutputLines::new();
        bank.add(LineId(0), MockPin { level: &level }, false, false).unwrap();

        bank.set_high(LineId(7));
        assert!(!level.get());
        assert_eq!(bank.is_set_high(LineId(7)), None);
    }

    #[test]
    fn test_duplicate_and_full() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let c = Cell::new(false);
        let mut bank: OutputLines<MockPin, 2> = OutputLines::new();

        bank.add(LineId(0), MockPin { level: &a }, false, false).unwrap();
        assert_eq!(
            bank.add(LineId(0), MockPin { level: &b }, false, false),
            Err(OutputError::DuplicateLine(LineId(0)))
        );
        bank.add(LineId(1), MockPin { level: &b }, false, true).unwrap();
        assert!(b.get());
        assert_eq!(
            bank.add(LineId(2), MockPin { level: &c }, false, false),
            Err(OutputError::Full)
        );
        assert_eq!(bank.len(), 2);
    }
}
