//! Events and opcodes

use crate::time::Ticks;

/// Identifier of one digital output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineId(pub u8);

impl LineId {
    /// Line index as usize, for addressing output banks
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Action requested by a table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Halt sequencing and stop the countdown
    End,
    /// Reload the table from position 0
    Restart,
    /// Drive a line high
    PinHigh(LineId),
    /// Drive a line low
    PinLow(LineId),
}

impl Opcode {
    /// Check if this opcode ends a pass through the table
    ///
    /// Terminal opcodes never advance the cursor.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Opcode::End | Opcode::Restart)
    }

    /// Line driven by this opcode, if any
    pub const fn line(&self) -> Option<LineId> {
        match self {
            Opcode::PinHigh(line) | Opcode::PinLow(line) => Some(*line),
            Opcode::End | Opcode::Restart => None,
        }
    }

    /// Short mnemonic for trace output
    pub const fn name(&self) -> &'static str {
        match self {
            Opcode::End => "END",
            Opcode::Restart => "RESTART",
            Opcode::PinHigh(_) => "PIN_HIGH",
            Opcode::PinLow(_) => "PIN_LOW",
        }
    }
}

/// A single timed entry in a table
///
/// `time` is absolute: the offset from the start of the table, not from
/// the previous event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
    /// Offset from table start
    pub time: Ticks,
    /// Action to perform
    pub opcode: Opcode,
}

impl Event {
    pub const fn new(time: Ticks, opcode: Opcode) -> Self {
        Self { time, opcode }
    }

    pub const fn high(time: Ticks, line: LineId) -> Self {
        Self::new(time, Opcode::PinHigh(line))
    }

    pub const fn low(time: Ticks, line: LineId) -> Self {
        Self::new(time, Opcode::PinLow(line))
    }

    pub const fn end(time: Ticks) -> Self {
        Self::new(time, Opcode::End)
    }

    pub const fn restart(time: Ticks) -> Self {
        Self::new(time, Opcode::Restart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_opcodes() {
        assert!(Opcode::End.is_terminal());
        assert!(Opcode::Restart.is_terminal());
        assert!(!Opcode::PinHigh(LineId(0)).is_terminal());
        assert!(!Opcode::PinLow(LineId(3)).is_terminal());
    }

    #[test]
    fn test_opcode_line() {
        assert_eq!(Opcode::PinHigh(LineId(2)).line(), Some(LineId(2)));
        assert_eq!(Opcode::PinLow(LineId(5)).line(), Some(LineId(5)));
        assert_eq!(Opcode::End.line(), None);
        assert_eq!(Opcode::Restart.line(), None);
    }
}
