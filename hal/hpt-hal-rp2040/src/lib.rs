//! RP2040 plumbing for the HPT sequencer
//!
//! Binds the board-agnostic `hpt-core` traits to embassy:
//!
//! - GPIO allocation by number for config-driven line setup
//! - A one-shot countdown driven by `embassy-time` alarms

#![no_std]

#[macro_use]
mod fmt;

pub mod countdown;
pub mod pins;

pub use countdown::{CountdownCommand, CountdownRunner, Expiry, SignalCountdown};
pub use pins::{PinBank, PinError};
