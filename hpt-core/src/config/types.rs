//! Configuration type definitions
//!
//! These types describe the sequencer hardware and the event tables it
//! can run. They are filled in by [`super::parse_config`] from the
//! embedded `sequencer.toml`.

use heapless::{String, Vec};

use crate::table::{Event, LineId, Table, TableError};
use crate::time::Ticks;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum output lines
pub const MAX_LINES: usize = 8;

/// Maximum tables per config
pub const MAX_TABLES: usize = 4;

/// Maximum events per table
pub const MAX_EVENTS: usize = 32;

/// Distinct pins: every line plus the button
const MAX_PINS: usize = MAX_LINES + 1;

/// Countdown period before the first table is started
pub const DEFAULT_INITIAL_PERIOD_MS: u64 = 1000;

/// Button debounce time
pub const DEFAULT_DEBOUNCE_MS: u32 = 50;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Two `[line.N]` sections with the same id
    DuplicateLine(LineId),
    /// The same GPIO is used twice
    DuplicatePin(u8),
    /// A table event drives a line with no `[line.N]` section
    UnknownLine(LineId),
    /// More than one table has `autostart = true`
    MultipleAutostart,
    /// A table failed validation
    Table(TableError),
}

impl From<TableError> for ConfigError {
    fn from(e: TableError) -> Self {
        ConfigError::Table(e)
    }
}

/// GPIO pin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Active-low (`!` prefix)
    pub inverted: bool,
    /// Pull-up enabled (`^` prefix), inputs only
    pub pull_up: bool,
}

/// Logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }
}

/// One output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Id used by table events
    pub id: LineId,
    /// Physical pin
    pub pin: PinConfig,
    /// Logical level driven at boot
    pub initial: Level,
}

/// Countdown resource configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountdownConfig {
    /// Name for diagnostics
    pub name: String<MAX_LABEL_LEN>,
    /// Period the countdown is created with
    pub initial_period: Ticks,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        let mut name = String::new();
        let _ = name.push_str("HPTimer");
        Self {
            name,
            initial_period: Ticks::from_millis(DEFAULT_INITIAL_PERIOD_MS),
        }
    }
}

/// Local control input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// Start/stop button, if fitted
    pub button: Option<PinConfig>,
    /// Debounce time in milliseconds
    pub debounce_ms: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            button: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// A named event table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableConfig {
    /// Table name from the section header
    pub name: String<MAX_LABEL_LEN>,
    /// Start this table at boot
    pub autostart: bool,
    /// Events in table order
    pub events: Vec<Event, MAX_EVENTS>,
}

impl TableConfig {
    /// Borrow the events as a runnable table
    pub fn table(&self) -> Result<Table<'_>, TableError> {
        Table::new(&self.events)
    }
}

/// Complete sequencer configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerConfig {
    pub countdown: CountdownConfig,
    pub lines: Vec<LineConfig, MAX_LINES>,
    pub control: ControlConfig,
    pub tables: Vec<TableConfig, MAX_TABLES>,
}

impl SequencerConfig {
    /// Create an empty configuration with default countdown and control
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a line by id
    pub fn find_line(&self, id: LineId) -> Option<&LineConfig> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Find a table by name
    pub fn find_table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.name.as_str() == name)
    }

    /// The table to start at boot, if any
    pub fn autostart_table(&self) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.autostart)
    }

    /// Check cross-references and table contents
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut pins: Vec<u8, MAX_PINS> = Vec::new();

        for (i, line) in self.lines.iter().enumerate() {
            if self.lines[..i].iter().any(|l| l.id == line.id) {
                return Err(ConfigError::DuplicateLine(line.id));
            }
            claim_pin(&mut pins, line.pin.pin)?;
        }

        if let Some(button) = self.control.button {
            claim_pin(&mut pins, button.pin)?;
        }

        for table in &self.tables {
            table.table()?.validate()?;

            for event in &table.events {
                if let Some(line) = event.opcode.line() {
                    if self.find_line(line).is_none() {
                        return Err(ConfigError::UnknownLine(line));
                    }
                }
            }
        }

        if self.tables.iter().filter(|t| t.autostart).count() > 1 {
            return Err(ConfigError::MultipleAutostart);
        }

        Ok(())
    }
}

fn claim_pin(pins: &mut Vec<u8, MAX_PINS>, pin: u8) -> Result<(), ConfigError> {
    if pins.contains(&pin) {
        return Err(ConfigError::DuplicatePin(pin));
    }
    // Capacity covers every line plus the button
    let _ = pins.push(pin);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u8, pin: u8) -> LineConfig {
        LineConfig {
            id: LineId(id),
            pin: PinConfig {
                pin,
                ..Default::default()
            },
            initial: Level::Low,
        }
    }

    fn table(name: &str, autostart: bool, events: &[Event]) -> TableConfig {
        let mut t = TableConfig {
            name: String::try_from(name).unwrap(),
            autostart,
            events: Vec::new(),
        };
        t.events.extend_from_slice(events).unwrap();
        t
    }

    fn ms(v: u64) -> Ticks {
        Ticks::from_millis(v)
    }

    #[test]
    fn test_valid_config() {
        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 25)).unwrap();
        config
            .tables
            .push(table(
                "blink",
                true,
                &[Event::high(ms(200), LineId(0)), Event::restart(ms(400))],
            ))
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.autostart_table().unwrap().name.as_str(), "blink");
        assert!(config.find_table("blink").is_some());
        assert!(config.find_table("other").is_none());
        assert_eq!(config.find_line(LineId(0)).unwrap().pin.pin, 25);
    }

    #[test]
    fn test_duplicate_line_and_pin() {
        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 25)).unwrap();
        config.lines.push(line(0, 24)).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::DuplicateLine(LineId(0))));

        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 25)).unwrap();
        config.lines.push(line(1, 25)).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePin(25)));

        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 14)).unwrap();
        config.control.button = Some(PinConfig {
            pin: 14,
            inverted: false,
            pull_up: true,
        });
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePin(14)));
    }

    #[test]
    fn test_unknown_line() {
        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 25)).unwrap();
        config
            .tables
            .push(table(
                "t",
                false,
                &[Event::high(ms(1), LineId(3)), Event::end(ms(2))],
            ))
            .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::UnknownLine(LineId(3))));
    }

    #[test]
    fn test_bad_tables() {
        let mut config = SequencerConfig::new();
        config.tables.push(table("empty", false, &[])).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::Table(TableError::Empty)));

        let mut config = SequencerConfig::new();
        config.lines.push(line(0, 25)).unwrap();
        config
            .tables
            .push(table("open", false, &[Event::high(ms(1), LineId(0))]))
            .unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Table(TableError::Unterminated))
        );
    }

    #[test]
    fn test_multiple_autostart() {
        let mut config = SequencerConfig::new();
        config
            .tables
            .push(table("a", true, &[Event::end(ms(1))]))
            .unwrap();
        config
            .tables
            .push(table("b", true, &[Event::end(ms(1))]))
            .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::MultipleAutostart));
    }
}
