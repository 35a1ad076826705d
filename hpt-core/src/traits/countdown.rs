//! One-shot countdown resource

use crate::time::Ticks;

/// A single re-armable one-shot countdown
///
/// Expiry is reported out of band: the implementation delivers it to
/// whatever context drives [`crate::Sequencer::on_expiry_for`]. It must
/// never report an expiry synchronously from inside one of these
/// methods, because they are called while the sequencer is locked.
pub trait Countdown {
    /// Tag every later arm, and the expiries it produces, with `epoch`
    ///
    /// The sequencer moves to a new epoch on each external start or
    /// restart. A countdown that queues expiries must hand the epoch back
    /// with each one so expiries of a replaced run can be told apart, and
    /// must count a new-epoch arm from now rather than from the last
    /// expiry.
    fn set_epoch(&mut self, epoch: u32) {
        let _ = epoch;
    }

    /// Set a new period and (re)start counting from now
    fn change_period_and_restart(&mut self, period: Ticks);

    /// Start counting with the current period
    ///
    /// Restarts the count if already running.
    fn start(&mut self);

    /// Stop counting; no expiry is reported afterwards
    fn stop(&mut self);
}
