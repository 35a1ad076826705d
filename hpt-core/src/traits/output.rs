//! Line-addressed digital outputs

use crate::table::LineId;

/// A set of binary output lines addressed by [`LineId`]
///
/// Implementations should ignore lines they do not own.
pub trait DigitalOutput {
    /// Drive a line to logic high
    fn set_high(&mut self, line: LineId);

    /// Drive a line to logic low
    fn set_low(&mut self, line: LineId);
}
