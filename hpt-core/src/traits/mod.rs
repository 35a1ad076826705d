//! Collaborator traits
//!
//! These traits define the interface between the interpreter and the
//! timer and GPIO implementations it drives.

pub mod countdown;
pub mod output;

pub use countdown::Countdown;
pub use output::DigitalOutput;
