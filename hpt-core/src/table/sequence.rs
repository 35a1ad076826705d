//! Bounded event tables

use super::event::Event;
use crate::time::Ticks;

/// Table construction and validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// Table has no events
    Empty,
    /// Event at `index` is earlier than the event before it
    Unsorted { index: usize },
    /// A pin event is reachable after the last entry (no `End`/`Restart`)
    Unterminated,
}

/// An ordered, non-empty event table
///
/// Borrows the caller's storage and carries its length, so the
/// interpreter can bounds-check every advance. Construction only rejects
/// empty slices; use [`Table::validate`] for a full content check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Table<'a> {
    events: &'a [Event],
}

impl<'a> Table<'a> {
    /// Wrap an event slice
    pub const fn new(events: &'a [Event]) -> Result<Self, TableError> {
        if events.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self { events })
    }

    /// Number of events
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; tables are non-empty by construction
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Event at `index`
    pub fn get(&self, index: usize) -> Option<&'a Event> {
        self.events.get(index)
    }

    /// First event, which determines the initial countdown period
    pub fn first(&self) -> &'a Event {
        &self.events[0]
    }

    /// Underlying events
    pub const fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn iter(&self) -> core::slice::Iter<'a, Event> {
        self.events.iter()
    }

    /// Delay between event `index` and the event after it
    ///
    /// Computed from the two absolute timestamps. Fails if there is no
    /// next event or the next event is earlier.
    pub fn delay_after(&self, index: usize) -> Option<Ticks> {
        let current = self.events.get(index)?;
        let next = self.events.get(index + 1)?;
        next.time.checked_sub(current.time)
    }

    /// Check ordering and termination
    ///
    /// A table is well formed when timestamps never decrease and the
    /// first terminal opcode exists. Events after the first `End` or
    /// `Restart` are unreachable and not checked for termination.
    pub fn validate(&self) -> Result<(), TableError> {
        for (index, pair) in self.events.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(TableError::Unsorted { index: index + 1 });
            }
        }

        if self.events.iter().any(|e| e.opcode.is_terminal()) {
            Ok(())
        } else {
            Err(TableError::Unterminated)
        }
    }
}
