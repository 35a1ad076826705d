//! Board-agnostic core of the HPT event sequencer
//!
//! This crate contains everything that does not depend on a specific
//! chip or timer implementation:
//!
//! - Time base and the event table data model
//! - Collaborator traits (countdown, digital output)
//! - Line-addressed output bank over `embedded-hal` pins
//! - Event table interpreter and its state machine
//! - Lock-guarded sequencer control handle
//! - Configuration types and the `sequencer.toml` parser

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod config;
pub mod output;
pub mod sequencer;
pub mod table;
pub mod time;
pub mod traits;

pub use sequencer::{Sequencer, SequencerError, State, Step};
pub use table::{Event, LineId, Opcode, Table, TableError};
pub use time::Ticks;
