//! Event table interpreter
//!
//! Owns the active table reference and cursor. Each countdown expiry
//! dispatches exactly one opcode and then either halts, reloads the
//! table, or re-arms the countdown for the delta to the next event.
//!
//! Deltas are always computed from the absolute timestamps of two
//! adjacent events, so rounding never accumulates across re-arms.

use super::error::SequencerError;
use super::machine::{State, Trigger};
use crate::table::{Opcode, Table};
use crate::time::Ticks;
use crate::traits::{Countdown, DigitalOutput};

/// Outcome of one countdown expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// A pin opcode ran and the countdown was re-armed for `delay`
    Advanced { opcode: Opcode, delay: Ticks },
    /// `Restart` ran; the table reloaded from position 0
    Looped,
    /// `End` ran; the countdown is stopped
    Halted,
    /// Expiry arrived while not armed (e.g. raced an external stop), or
    /// belongs to a run that was since restarted or replaced
    Ignored,
}

/// Point-in-time view of the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Current state
    pub state: State,
    /// Index of the event awaited next
    pub cursor: usize,
    /// Length of the active table (0 if none)
    pub table_len: usize,
    /// `Restart` opcodes executed since the last `start`
    pub loops: u32,
    /// Arm epoch of the current run
    pub epoch: u32,
}

/// Event table interpreter
pub struct Interpreter<'t, C, O> {
    /// Active table (non-owning)
    table: Option<Table<'t>>,
    /// Event awaited next; always `< table.len()` while a table is set
    cursor: usize,
    state: State,
    loops: u32,
    /// Bumped by every external start/restart; the `Restart` opcode keeps it
    epoch: u32,
    countdown: C,
    output: O,
}

impl<'t, C: Countdown, O: DigitalOutput> Interpreter<'t, C, O> {
    /// Create an idle interpreter with no table
    pub const fn new(countdown: C, output: O) -> Self {
        Self {
            table: None,
            cursor: 0,
            state: State::Idle,
            loops: 0,
            epoch: 0,
            countdown,
            output,
        }
    }

    /// Load a table and arm the countdown for its first event
    ///
    /// Replaces any table already running.
    pub fn start(&mut self, table: Table<'t>) {
        debug!("Starting table of {} events", table.len());

        self.table = Some(table);
        self.loops = 0;
        self.next_epoch();
        self.arm_first(table);
        self.state = self.state.transition(Trigger::Start);
    }

    /// Reload the active table from position 0
    ///
    /// Returns [`SequencerError::NoActiveTable`] and changes nothing if no
    /// table was ever started.
    pub fn restart(&mut self) -> Result<(), SequencerError> {
        let table = self.table.ok_or(SequencerError::NoActiveTable)?;

        self.next_epoch();
        self.arm_first(table);
        self.state = self.state.transition(Trigger::Restart);
        Ok(())
    }

    /// Stop the countdown
    ///
    /// The table stays loaded so a later `restart()` runs it again.
    /// Output lines keep whatever state the last opcode set.
    pub fn stop(&mut self) {
        debug!("Stopping at event {}", self.cursor);

        self.countdown.stop();
        self.state = self.state.transition(Trigger::Stop);
    }

    /// Handle one countdown expiry tagged with the epoch it was armed in
    ///
    /// Expiries from an earlier epoch were armed for a run that has since
    /// been restarted or replaced, and are ignored.
    pub fn on_expiry_for(&mut self, epoch: u32) -> Result<Step, SequencerError> {
        if epoch != self.epoch {
            trace!("Expiry of epoch {} ignored in epoch {}", epoch, self.epoch);
            return Ok(Step::Ignored);
        }
        self.on_expiry()
    }

    /// Handle one countdown expiry of the current epoch
    pub fn on_expiry(&mut self) -> Result<Step, SequencerError> {
        let table = match (self.state, self.table) {
            (State::Armed, Some(table)) => table,
            _ => {
                trace!("Expiry ignored while {}", self.state);
                return Ok(Step::Ignored);
            }
        };
        self.state = self.state.transition(Trigger::Expired);

        let Some(event) = table.get(self.cursor).copied() else {
            return Err(self.halt_malformed(self.cursor));
        };
        trace!("{} at {}us", event.opcode.name(), event.time.as_micros());

        match event.opcode {
            Opcode::End => {
                self.countdown.stop();
                self.state = self.state.transition(Trigger::Halted);
                return Ok(Step::Halted);
            }
            Opcode::Restart => {
                self.loops = self.loops.wrapping_add(1);
                self.arm_first(table);
                self.state = self.state.transition(Trigger::Restart);
                return Ok(Step::Looped);
            }
            Opcode::PinHigh(line) => self.output.set_high(line),
            Opcode::PinLow(line) => self.output.set_low(line),
        }

        let Some(delay) = table.delay_after(self.cursor) else {
            return Err(self.halt_malformed(self.cursor));
        };
        self.cursor += 1;
        self.countdown.change_period_and_restart(delay);
        self.state = self.state.transition(Trigger::Rearmed);

        Ok(Step::Advanced {
            opcode: event.opcode,
            delay,
        })
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Index of the event awaited next
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Active table, if any
    pub fn table(&self) -> Option<Table<'t>> {
        self.table
    }

    /// `Restart` opcodes executed since the last `start`
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Arm epoch of the current run
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.state,
            cursor: self.cursor,
            table_len: self.table.map_or(0, |t| t.len()),
            loops: self.loops,
            epoch: self.epoch,
        }
    }

    pub fn countdown(&self) -> &C {
        &self.countdown
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn arm_first(&mut self, table: Table<'t>) {
        self.countdown.change_period_and_restart(table.first().time);
        self.cursor = 0;
        self.countdown.start();
    }

    fn next_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.countdown.set_epoch(self.epoch);
    }

    fn halt_malformed(&mut self, index: usize) -> SequencerError {
        warn!("Malformed table after event {}, halting", index);

        self.countdown.stop();
        self.state = self.state.transition(Trigger::Halted);
        SequencerError::MalformedTable { index }
    }
}
