//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod countdown;
pub mod sequencer;

pub use button::{button_task, ButtonConfig};
pub use countdown::countdown_task;
pub use sequencer::sequencer_task;
