//! Sequencer configuration
//!
//! Hardware wiring and event tables are described in `sequencer.toml`,
//! embedded into the firmware at build time and parsed at boot.

pub mod parse;
pub mod types;

pub use parse::{parse_config, parse_pin, ParseError};
pub use types::*;
