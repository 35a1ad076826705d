//! Event table sequencer
//!
//! The interpreter executes one opcode per countdown expiry and re-arms
//! the countdown for the delta to the next event. The control handle
//! guards it so expiries and application calls never interleave.

pub mod control;
pub mod error;
pub mod interpreter;
pub mod machine;

#[cfg(test)]
mod testing;

pub use control::Sequencer;
pub use error::SequencerError;
pub use interpreter::{Interpreter, Status, Step};
pub use machine::{State, Trigger};
