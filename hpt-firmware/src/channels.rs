//! Inter-task communication channels
//!
//! The countdown is split in two halves: the sequencer posts commands to
//! [`COUNTDOWN_CMD`] and the countdown task reports each expiry through
//! [`EXPIRY_CHANNEL`].

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use hpt_hal_rp2040::{CountdownCommand, Expiry};

/// Channel capacity for expiries waiting on the sequencer task
pub const EXPIRY_CHANNEL_SIZE: usize = 4;

/// Latest countdown command (arm / stop) from the sequencer
pub static COUNTDOWN_CMD: Signal<CriticalSectionRawMutex, CountdownCommand> = Signal::new();

/// Countdown expiries, consumed only by the sequencer task
pub static EXPIRY_CHANNEL: Channel<CriticalSectionRawMutex, Expiry, EXPIRY_CHANNEL_SIZE> =
    Channel::new();
