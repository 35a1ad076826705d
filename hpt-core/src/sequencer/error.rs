//! Sequencer errors

use crate::table::TableError;

/// Errors reported by the sequencer
///
/// All of these are programming or configuration errors; none is
/// transient, so nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// `restart()` called before any table was started
    NoActiveTable,
    /// Advancing from the event at `index` found no valid next event:
    /// either the table ran out without `End`/`Restart`, or the next
    /// timestamp is earlier. The run was halted.
    MalformedTable { index: usize },
    /// A table could not be constructed
    Table(TableError),
}

impl From<TableError> for SequencerError {
    fn from(e: TableError) -> Self {
        SequencerError::Table(e)
    }
}
