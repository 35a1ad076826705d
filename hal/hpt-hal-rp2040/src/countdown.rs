//! One-shot countdown on `embassy-time`
//!
//! The sequencer drives a [`SignalCountdown`], which only posts the
//! latest command to a signal. A [`CountdownRunner`] owns the alarm: it
//! waits for either the deadline or a new command, and on expiry pushes
//! an [`Expiry`] into a channel for the sequencer task.
//!
//! Posting a command never blocks and never reports an expiry inline, so
//! it is safe to call while the sequencer lock is held.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};

use hpt_core::time::Ticks;
use hpt_core::traits::Countdown;

/// Command from the sequencer to the runner
///
/// Each command fully describes the wanted alarm state, so only the
/// most recent one matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountdownCommand {
    /// (Re)start counting down `period`, tagged with the sequencer epoch
    Arm { period: Ticks, epoch: u32 },
    /// Cancel the pending alarm
    Stop,
}

/// One countdown expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Expiry {
    /// Instant the alarm was due
    pub deadline: Instant,
    /// Epoch of the arm that produced it
    pub epoch: u32,
}

/// Sequencer-side half of the countdown
pub struct SignalCountdown<'a, M: RawMutex> {
    period: Ticks,
    epoch: u32,
    commands: &'a Signal<M, CountdownCommand>,
}

impl<'a, M: RawMutex> SignalCountdown<'a, M> {
    /// Create a stopped countdown with an initial period
    pub fn new(name: &str, period: Ticks, commands: &'a Signal<M, CountdownCommand>) -> Self {
        debug!("Countdown {} created, period {} us", name, period.as_micros());
        Self {
            period,
            epoch: 0,
            commands,
        }
    }

    fn arm(&self) {
        self.commands.signal(CountdownCommand::Arm {
            period: self.period,
            epoch: self.epoch,
        });
    }
}

impl<M: RawMutex> Countdown for SignalCountdown<'_, M> {
    fn set_epoch(&mut self, epoch: u32) {
        self.epoch = epoch;
    }

    fn change_period_and_restart(&mut self, period: Ticks) {
        self.period = period;
        self.arm();
    }

    fn start(&mut self) {
        self.arm();
    }

    fn stop(&mut self) {
        self.commands.signal(CountdownCommand::Stop);
    }
}

/// Alarm-side half of the countdown
pub struct CountdownRunner<'a, M: RawMutex, const N: usize> {
    commands: &'a Signal<M, CountdownCommand>,
    expiries: Sender<'a, M, Expiry, N>,
}

impl<'a, M: RawMutex, const N: usize> CountdownRunner<'a, M, N> {
    pub fn new(commands: &'a Signal<M, CountdownCommand>, expiries: Sender<'a, M, Expiry, N>) -> Self {
        Self { commands, expiries }
    }

    /// Serve commands and fire expiries forever
    pub async fn run(&mut self) -> ! {
        let mut pending: Option<Expiry> = None;
        // Last expiry not yet answered by a command
        let mut fired: Option<Expiry> = None;

        loop {
            let command = match pending {
                Some(alarm) => match select(Timer::at(alarm.deadline), self.commands.wait()).await {
                    Either::First(()) => {
                        pending = None;
                        fired = Some(alarm);
                        trace!("Countdown expired, epoch {}", alarm.epoch);
                        self.expiries.send(alarm).await;
                        continue;
                    }
                    Either::Second(command) => command,
                },
                None => self.commands.wait().await,
            };

            match command {
                CountdownCommand::Arm { period, epoch } => {
                    let deadline = next_deadline(fired.take(), period, epoch, Instant::now());
                    pending = Some(Expiry { deadline, epoch });
                }
                CountdownCommand::Stop => {
                    pending = None;
                    fired = None;
                }
            }
        }
    }
}

/// Convert sequencer ticks to an embassy duration
pub fn duration(period: Ticks) -> Duration {
    Duration::from_micros(period.as_micros())
}

/// Deadline for an `Arm` of `period` in `epoch`, received at `now`
///
/// A re-arm answering an expiry of the same epoch counts from that
/// expiry's deadline, so handling latency does not accumulate over a
/// table. An arm for a new epoch always counts from `now`, as does one
/// whose anchored deadline is already behind `now` (the expiry went
/// unanswered).
pub fn next_deadline(fired: Option<Expiry>, period: Ticks, epoch: u32, now: Instant) -> Instant {
    let period = duration(period);
    match fired {
        Some(last) if last.epoch == epoch && last.deadline + period >= now => {
            last.deadline + period
        }
        _ => now + period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn at(us: u64) -> Instant {
        Instant::from_micros(us)
    }

    fn expiry(us: u64, epoch: u32) -> Option<Expiry> {
        Some(Expiry {
            deadline: at(us),
            epoch,
        })
    }

    #[test]
    fn test_fresh_arm_counts_from_now() {
        let d = next_deadline(None, Ticks::from_millis(5), 1, at(1_000));
        assert_eq!(d, at(6_000));
    }

    #[test]
    fn test_rearm_anchors_to_expiry() {
        // Expiry due at 10ms, handled 300us late, next event 50ms later
        let d = next_deadline(expiry(10_000, 1), Ticks::from_millis(50), 1, at(10_300));
        assert_eq!(d, at(60_000));
    }

    #[test]
    fn test_zero_delta_fires_at_expiry_deadline() {
        let d = next_deadline(expiry(10_000, 1), Ticks::ZERO, 1, at(10_000));
        assert_eq!(d, at(10_000));
    }

    #[test]
    fn test_stale_anchor_ignored() {
        let d = next_deadline(expiry(10_000, 1), Ticks::from_millis(1), 1, at(500_000));
        assert_eq!(d, at(501_000));
    }

    #[test]
    fn test_new_epoch_counts_from_now() {
        // Old table fired at 10ms; a new table started 100us later must
        // not borrow that deadline as its anchor
        let d = next_deadline(expiry(10_000, 1), Ticks::from_millis(100), 2, at(10_100));
        assert_eq!(d, at(110_100));
    }

    #[test]
    fn test_arm_carries_epoch() {
        let commands: Signal<NoopRawMutex, CountdownCommand> = Signal::new();
        let mut countdown = SignalCountdown::new("test", Ticks::from_millis(1), &commands);

        countdown.set_epoch(7);
        countdown.change_period_and_restart(Ticks::from_millis(3));
        assert_eq!(
            commands.try_take(),
            Some(CountdownCommand::Arm {
                period: Ticks::from_millis(3),
                epoch: 7
            })
        );

        countdown.stop();
        assert_eq!(commands.try_take(), Some(CountdownCommand::Stop));
    }

    #[test]
    fn test_duration_is_microseconds() {
        assert_eq!(duration(Ticks::from_millis(3)), Duration::from_micros(3_000));
    }
}
