//! Test doubles for the sequencer collaborators

use std::vec::Vec;

use crate::table::LineId;
use crate::time::Ticks;
use crate::traits::{Countdown, DigitalOutput};

/// A call made on the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownCall {
    Period(Ticks),
    Start,
    Stop,
}

/// Countdown that records every call instead of counting
#[derive(Debug, Default)]
pub struct FakeCountdown {
    pub calls: Vec<CountdownCall>,
    pub running: bool,
    pub epoch: u32,
}

impl FakeCountdown {
    /// Every period programmed so far, in order
    pub fn periods(&self) -> Vec<Ticks> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                CountdownCall::Period(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn last_period(&self) -> Option<Ticks> {
        self.periods().last().copied()
    }
}

impl Countdown for FakeCountdown {
    fn set_epoch(&mut self, epoch: u32) {
        self.epoch = epoch;
    }

    fn change_period_and_restart(&mut self, period: Ticks) {
        self.calls.push(CountdownCall::Period(period));
        self.running = true;
    }

    fn start(&mut self) {
        self.calls.push(CountdownCall::Start);
        self.running = true;
    }

    fn stop(&mut self) {
        self.calls.push(CountdownCall::Stop);
        self.running = false;
    }
}

/// Output that records every line change
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub changes: Vec<(LineId, bool)>,
}

impl DigitalOutput for RecordingOutput {
    fn set_high(&mut self, line: LineId) {
        self.changes.push((line, true));
    }

    fn set_low(&mut self, line: LineId) {
        self.changes.push((line, false));
    }
}
