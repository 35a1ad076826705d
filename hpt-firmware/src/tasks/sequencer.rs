//! Expiry handling task
//!
//! Sole consumer of the expiry channel. Each expiry executes exactly one
//! table event through the shared sequencer, unless it was armed before
//! the last start or restart.

use defmt::*;

use hpt_core::Step;

use crate::channels::EXPIRY_CHANNEL;
use crate::FwSequencer;

#[embassy_executor::task]
pub async fn sequencer_task(sequencer: &'static FwSequencer) {
    info!("Sequencer task started");

    loop {
        let expiry = EXPIRY_CHANNEL.receive().await;

        match sequencer.on_expiry_for(expiry.epoch) {
            Ok(Step::Advanced { opcode, delay }) => {
                trace!(
                    "{} at {}, next in {} us",
                    opcode.name(),
                    expiry.deadline,
                    delay.as_micros()
                );
            }
            Ok(Step::Looped) => debug!("Table looped"),
            Ok(Step::Halted) => info!("Table finished"),
            Ok(Step::Ignored) => trace!("Expiry ignored, epoch {} not armed", expiry.epoch),
            Err(e) => error!("Sequencer halted: {:?}", e),
        }
    }
}
