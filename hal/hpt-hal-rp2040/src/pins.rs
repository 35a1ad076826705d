//! GPIO allocation by number
//!
//! Line and button pins come from `sequencer.toml`, so they are taken
//! from a bank at runtime instead of being named in code.

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::{Peri, Peripherals};

use hpt_core::config::{LineConfig, PinConfig};

/// Number of user GPIOs on the RP2040
pub const NUM_PINS: usize = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
}

/// Holds every GPIO and hands them out by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; NUM_PINS],
}

impl PinBank {
    /// Take ownership of all GPIO pins
    ///
    /// After this call, pins must be obtained through [`PinBank::take`].
    pub fn new(p: Peripherals) -> Self {
        Self {
            pins: [
                Some(p.PIN_0.into()),
                Some(p.PIN_1.into()),
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin(pin_num))?
            .take()
            .ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Take a line's pin as a push-pull output at its initial level
    pub fn output(&mut self, line: &LineConfig) -> Result<Output<'static>, PinError> {
        let pin = self.take(line.pin.pin)?;
        // Physical level: logical initial, flipped for active-low lines
        let level = if line.initial.is_high() != line.pin.inverted {
            Level::High
        } else {
            Level::Low
        };
        Ok(Output::new(pin, level))
    }

    /// Take a pin as an input, pulled up if `^` was given and down otherwise
    pub fn input(&mut self, cfg: &PinConfig) -> Result<Input<'static>, PinError> {
        let pin = self.take(cfg.pin)?;
        let pull = if cfg.pull_up { Pull::Up } else { Pull::Down };
        Ok(Input::new(pin, pull))
    }
}
