//! Local start/stop button
//!
//! A debounced press stops the sequencer while it runs. While idle it
//! restarts the loaded table, or starts the default table if none was
//! ever loaded.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use hpt_core::{SequencerError, Table};

use crate::FwSequencer;

/// Poll interval
const POLL_MS: u32 = 10;

/// Button configuration
pub struct ButtonConfig {
    /// Debounce time in milliseconds
    pub debounce_ms: u32,
    /// Pressed reads low (switch to ground)
    pub active_low: bool,
    /// Table started when nothing is loaded yet
    pub default_table: Option<Table<'static>>,
}

#[embassy_executor::task]
pub async fn button_task(pin: Input<'static>, sequencer: &'static FwSequencer, config: ButtonConfig) {
    info!("Button task started");

    let mut ticker = Ticker::every(Duration::from_millis(POLL_MS as u64));
    let debounce_threshold = (config.debounce_ms / POLL_MS).max(1);
    let mut counter: u32 = 0;
    let mut pressed = false;

    loop {
        ticker.next().await;

        let down = if config.active_low {
            pin.is_low()
        } else {
            pin.is_high()
        };

        if down {
            counter = counter.saturating_add(1);
            if counter >= debounce_threshold && !pressed {
                pressed = true;
                on_press(sequencer, config.default_table);
            }
        } else {
            // Release needs the same settle time as a press
            counter = counter.min(debounce_threshold).saturating_sub(1);
            if counter == 0 {
                pressed = false;
            }
        }
    }
}

fn on_press(sequencer: &FwSequencer, default_table: Option<Table<'static>>) {
    if sequencer.state().is_running() {
        sequencer.stop();
        info!("Stopped by button");
        return;
    }

    match sequencer.restart() {
        Ok(()) => info!("Restarted by button"),
        Err(SequencerError::NoActiveTable) => match default_table {
            Some(table) => {
                info!("Started default table by button");
                sequencer.start(table);
            }
            None => warn!("Button pressed but no table is configured"),
        },
        Err(e) => error!("Restart failed: {:?}", e),
    }
}
