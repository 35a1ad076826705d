//! Event table data model
//!
//! A table is an ordered list of `(absolute time, opcode)` pairs that
//! defines one sequencing run.

pub mod event;
pub mod sequence;

pub use event::{Event, LineId, Opcode};
pub use sequence::{Table, TableError};
