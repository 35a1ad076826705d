//! Sequencer state machine
//!
//! The interpreter's lifecycle as a pure transition function, so the
//! allowed transitions can be reasoned about apart from table handling.

/// Interpreter states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No countdown armed; a table may or may not be loaded
    Idle,
    /// Countdown armed for the event at the cursor
    Armed,
    /// Expiry handler dispatching the event at the cursor
    Executing,
}

/// Things that move the interpreter between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// A table was loaded and armed
    Start,
    /// The current table was reloaded from position 0
    Restart,
    /// The countdown expired
    Expired,
    /// The countdown was re-armed for the next event
    Rearmed,
    /// An `End` opcode or a malformed table halted the run
    Halted,
    /// External stop request
    Stop,
}

impl State {
    /// Check if a countdown is outstanding
    pub fn is_running(&self) -> bool {
        !matches!(self, State::Idle)
    }

    /// Process a trigger and return the next state
    pub fn transition(self, trigger: Trigger) -> Self {
        use State::*;
        use Trigger::*;

        match (self, trigger) {
            // Loading or reloading a table always arms
            (_, Start) => Armed,
            (_, Restart) => Armed,

            (Armed, Expired) => Executing,

            (Executing, Rearmed) => Armed,
            (Executing, Halted) => Idle,

            (_, Stop) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_arms_from_any_state() {
        for state in [State::Idle, State::Armed, State::Executing] {
            assert_eq!(state.transition(Trigger::Start), State::Armed);
        }
    }

    #[test]
    fn test_expiry_cycle() {
        let executing = State::Armed.transition(Trigger::Expired);
        assert_eq!(executing, State::Executing);

        assert_eq!(executing.transition(Trigger::Rearmed), State::Armed);
        assert_eq!(executing.transition(Trigger::Halted), State::Idle);
        // Restart opcode re-arms through the nested restart
        assert_eq!(executing.transition(Trigger::Restart), State::Armed);
    }

    #[test]
    fn test_expiry_ignored_when_idle() {
        assert_eq!(State::Idle.transition(Trigger::Expired), State::Idle);
        assert_eq!(State::Idle.transition(Trigger::Rearmed), State::Idle);
    }

    #[test]
    fn test_stop_from_any_state() {
        for state in [State::Idle, State::Armed, State::Executing] {
            assert_eq!(state.transition(Trigger::Stop), State::Idle);
        }
    }

    #[test]
    fn test_is_running() {
        assert!(!State::Idle.is_running());
        assert!(State::Armed.is_running());
        assert!(State::Executing.is_running());
    }
}
