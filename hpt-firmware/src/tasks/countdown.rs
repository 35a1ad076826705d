//! Countdown alarm task

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use hpt_hal_rp2040::CountdownRunner;

use crate::channels::EXPIRY_CHANNEL_SIZE;

/// Owns the countdown alarm
///
/// Waits for arm/stop commands from the sequencer and pushes an expiry
/// into the expiry channel whenever a deadline passes.
#[embassy_executor::task]
pub async fn countdown_task(
    mut runner: CountdownRunner<'static, CriticalSectionRawMutex, EXPIRY_CHANNEL_SIZE>,
) {
    info!("Countdown task started");
    runner.run().await
}
