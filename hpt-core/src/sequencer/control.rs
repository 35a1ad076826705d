//! Sequencer control handle
//!
//! Owns the single interpreter behind a blocking mutex so the expiry
//! handler and application contexts never observe each other mid-update.
//! The `Restart` opcode's nested reload runs inside the same lock
//! acquisition as the expiry that triggered it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::error::SequencerError;
use super::interpreter::{Interpreter, Status, Step};
use super::machine::State;
use crate::table::{Event, Table};
use crate::traits::{Countdown, DigitalOutput};

/// Shared, lock-guarded sequencer
///
/// Construct once at startup and share by reference (typically
/// `&'static`) between the expiry consumer and application tasks.
pub struct Sequencer<'t, M: RawMutex, C, O> {
    inner: Mutex<M, RefCell<Interpreter<'t, C, O>>>,
}

impl<'t, M: RawMutex, C: Countdown, O: DigitalOutput> Sequencer<'t, M, C, O> {
    /// Create an idle sequencer
    pub const fn new(countdown: C, output: O) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Interpreter::new(countdown, output))),
        }
    }

    /// Load a table and arm for its first event, replacing any running table
    pub fn start(&self, table: Table<'t>) {
        self.with(|interp| interp.start(table));
    }

    /// Build a table from `events` and start it
    pub fn start_events(&self, events: &'t [Event]) -> Result<(), SequencerError> {
        let table = Table::new(events)?;
        self.start(table);
        Ok(())
    }

    /// Reload the active table from position 0
    pub fn restart(&self) -> Result<(), SequencerError> {
        self.with(|interp| interp.restart())
    }

    /// Stop the countdown, keeping the table loaded
    pub fn stop(&self) {
        self.with(|interp| interp.stop());
    }

    /// Handle one countdown expiry of the current epoch
    pub fn on_expiry(&self) -> Result<Step, SequencerError> {
        self.with(|interp| interp.on_expiry())
    }

    /// Handle one countdown expiry armed in `epoch`
    ///
    /// Expiries queued before a `start` or `restart` are ignored.
    pub fn on_expiry_for(&self, epoch: u32) -> Result<Step, SequencerError> {
        self.with(|interp| interp.on_expiry_for(epoch))
    }

    /// Current state
    pub fn state(&self) -> State {
        self.with(|interp| interp.state())
    }

    pub fn status(&self) -> Status {
        self.with(|interp| interp.status())
    }

    /// Run `f` with exclusive access to the interpreter
    ///
    /// `f` must not call back into this sequencer.
    pub fn with<R>(&self, f: impl FnOnce(&mut Interpreter<'t, C, O>) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }
}
