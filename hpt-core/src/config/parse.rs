//! Parser for `sequencer.toml`
//!
//! This is a minimal line-oriented TOML parser that handles only the
//! subset the sequencer configuration needs. It does NOT support the full
//! TOML grammar.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - `[section]` and `[section.name]` headers
//! - Inline tables inside arrays: `events = [{ at_ms = 100, op = "high", line = 0 }]`
//! - Arrays spanning several lines
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings
//! - Nested inline tables
//! - Dotted keys outside section headers

use heapless::String;

use super::types::{
    ControlConfig, CountdownConfig, Level, LineConfig, PinConfig, SequencerConfig, TableConfig,
    MAX_LABEL_LEN,
};
use crate::table::{Event, LineId, Opcode};
use crate::time::Ticks;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// An event inline table is missing `at_ms`/`at_us`, `op` or `line`
    MissingField,
    /// An array was still open at end of input
    UnterminatedArray,
}

/// Current parsing context
///
/// Line and table sections carry the entry being built; it is committed
/// to the config when the next header (or end of input) is reached.
enum Section {
    Root,
    Countdown,
    Control,
    Line(LineConfig),
    Table(TableConfig),
}

/// Parse TOML configuration into a [`SequencerConfig`]
///
/// Only syntax and value types are checked here; call
/// [`SequencerConfig::validate`] for cross-references.
pub fn parse_config(input: &str) -> Result<SequencerConfig, ParseError> {
    let mut config = SequencerConfig::new();
    let mut section = Section::Root;

    // Key and byte offset of an array value still waiting for its `]`
    let mut pending: Option<(&str, usize)> = None;
    let mut offset = 0;

    for raw in input.split_inclusive('\n') {
        let line_start = offset;
        offset += raw.len();

        if let Some((key, start)) = pending {
            let value = &input[start..offset];
            if bracket_depth(value) > 0 {
                continue;
            }
            pending = None;
            apply_value(&mut section, &mut config, key, value.trim())?;
            continue;
        }

        let line = strip_comment(raw).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            let next = parse_section_header(&line[1..line.len() - 1])?;
            let previous = core::mem::replace(&mut section, next);
            commit_section(previous, &mut config)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            if value.starts_with('[') && bracket_depth(value) > 0 {
                // Array continues on following lines; remember where it began
                let eq = raw.find('=').unwrap_or(0);
                let open = raw[eq..].find('[').unwrap_or(0);
                pending = Some((key, line_start + eq + open));
                continue;
            }
            apply_value(&mut section, &mut config, key, value)?;
        }
    }

    if pending.is_some() {
        return Err(ParseError::UnterminatedArray);
    }

    commit_section(section, &mut config)?;

    Ok(config)
}

/// Parse section header like "countdown", "line.0" or "table.blink"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    match header.split_once('.') {
        None => match header {
            "countdown" => Ok(Section::Countdown),
            "control" => Ok(Section::Control),
            _ => Err(ParseError::InvalidSection),
        },
        Some(("line", id)) => {
            let id: u8 = id.trim().parse().map_err(|_| ParseError::InvalidSection)?;
            Ok(Section::Line(LineConfig {
                id: LineId(id),
                ..Default::default()
            }))
        }
        Some(("table", name)) => {
            let name: String<MAX_LABEL_LEN> =
                String::try_from(name.trim()).map_err(|_| ParseError::InvalidSection)?;
            Ok(Section::Table(TableConfig {
                name,
                ..Default::default()
            }))
        }
        Some(_) => Err(ParseError::InvalidSection),
    }
}

/// Move a finished line or table section into the config
fn commit_section(section: Section, config: &mut SequencerConfig) -> Result<(), ParseError> {
    match section {
        Section::Line(line) => config
            .lines
            .push(line)
            .map_err(|_| ParseError::TooManyItems),
        Section::Table(table) => config
            .tables
            .push(table)
            .map_err(|_| ParseError::TooManyItems),
        Section::Root | Section::Countdown | Section::Control => Ok(()),
    }
}

/// Apply a parsed value to the appropriate config field
fn apply_value(
    section: &mut Section,
    config: &mut SequencerConfig,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {}
        Section::Countdown => apply_countdown(&mut config.countdown, key, value)?,
        Section::Control => apply_control(&mut config.control, key, value)?,
        Section::Line(line) => match key {
            "pin" => line.pin = parse_pin(value)?,
            "initial" => line.initial = parse_level(value)?,
            _ => {} // Ignore unknown keys
        },
        Section::Table(table) => match key {
            "autostart" => table.autostart = parse_bool(value)?,
            "events" => parse_events(value, table)?,
            _ => {}
        },
    }
    Ok(())
}

fn apply_countdown(c: &mut CountdownConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "name" => {
            c.name = String::try_from(parse_string(value)?).map_err(|_| ParseError::InvalidValue)?
        }
        "initial_period_ms" => c.initial_period = parse_millis(value)?,
        "initial_period_us" => c.initial_period = parse_micros(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_control(c: &mut ControlConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "button" => c.button = Some(parse_pin(value)?),
        "debounce_ms" => c.debounce_ms = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Cut a trailing comment, leaving `#` inside strings alone
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Net count of open `[` brackets, ignoring strings and comments
fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0;
    for line in text.lines() {
        let mut in_string = false;
        for c in strip_comment(line).chars() {
            match c {
                '"' => in_string = !in_string,
                '[' if !in_string => depth += 1,
                ']' if !in_string => depth -= 1,
                _ => {}
            }
        }
    }
    depth
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a millisecond count, rejecting values past the tick range
fn parse_millis(value: &str) -> Result<Ticks, ParseError> {
    Ticks::checked_from_millis(parse_int(value)?).ok_or(ParseError::InvalidValue)
}

/// Parse a microsecond count, rejecting values past the tick range
fn parse_micros(value: &str) -> Result<Ticks, ParseError> {
    Ticks::checked_from_micros(parse_int(value)?).ok_or(ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a logic level
fn parse_level(value: &str) -> Result<Level, ParseError> {
    match parse_string(value)? {
        "low" | "Low" => Ok(Level::Low),
        "high" | "High" => Ok(Level::High),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin string like "gpio25", "!gpio15", "^gpio14"
pub fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let mut s = parse_string(value)?;
    let mut inverted = false;
    let mut pull_up = false;

    // Check for modifiers
    loop {
        if let Some(rest) = s.strip_prefix('!') {
            inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let num = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ParseError::InvalidPin)?;

    Ok(PinConfig {
        pin,
        inverted,
        pull_up,
    })
}

/// Parse an events array into `table`
///
/// Each element is an inline table `{ at_ms = N, op = "...", line = N }`;
/// `at_us` may replace `at_ms`, and `line` is only used by pin opcodes.
fn parse_events(value: &str, table: &mut TableConfig) -> Result<(), ParseError> {
    let value = value.trim();
    if !value.starts_with('[') || !value.ends_with(']') {
        return Err(ParseError::InvalidValue);
    }
    let inner = &value[1..value.len() - 1];

    let mut depth = 0;
    let mut start = 0;
    let mut base = 0;

    for line in inner.split_inclusive('\n') {
        let line_base = base;
        base += line.len();
        for (i, c) in strip_comment(line).char_indices() {
            let i = line_base + i;
            match c {
                '{' => {
                    if depth == 0 {
                        start = i;
                    }
                    depth += 1;
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let event = parse_single_event(&inner[start..=i])?;
                        table
                            .events
                            .push(event)
                            .map_err(|_| ParseError::TooManyItems)?;
                    }
                }
                _ => {}
            }
        }
    }

    if depth != 0 {
        return Err(ParseError::InvalidValue);
    }

    Ok(())
}

/// Parse a single event like { at_ms = 100, op = "high", line = 0 }
fn parse_single_event(s: &str) -> Result<Event, ParseError> {
    let s = s.trim();
    let inner = &s[1..s.len() - 1];

    let mut time = None;
    let mut op = None;
    let mut line = None;

    for part in inner.split(',') {
        let Some((key, value)) = parse_key_value(part.trim()) else {
            continue;
        };
        match key {
            "at_ms" => time = Some(parse_millis(value)?),
            "at_us" => time = Some(parse_micros(value)?),
            "op" => op = Some(parse_string(value)?),
            "line" => line = Some(LineId(parse_int(value)?)),
            _ => {}
        }
    }

    let time = time.ok_or(ParseError::MissingField)?;
    let opcode = match op.ok_or(ParseError::MissingField)? {
        "high" => Opcode::PinHigh(line.ok_or(ParseError::MissingField)?),
        "low" => Opcode::PinLow(line.ok_or(ParseError::MissingField)?),
        "end" => Opcode::End,
        "restart" => Opcode::Restart,
        _ => return Err(ParseError::InvalidValue),
    };

    Ok(Event::new(time, opcode))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Test configuration
[countdown]
name = "HPTimer"
initial_period_ms = 500

[line.0]
pin = "gpio25"          # on-board LED
initial = "low"

[line.1]
pin = "!gpio15"
initial = "high"

[control]
button = "^gpio14"
debounce_ms = 30

[table.pulse]
events = [{ at_ms = 100, op = "high", line = 0 }, { at_ms = 150, op = "low", line = 0 }, { at_ms = 150, op = "end" }]

[table.blink]
autostart = true
events = [
    # on for 200ms, off for 200ms
    { at_ms = 200, op = "high", line = 0 },
    { at_us = 400000, op = "low", line = 0 },
    { at_ms = 400, op = "restart" },
]
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();

        assert_eq!(config.countdown.name.as_str(), "HPTimer");
        assert_eq!(config.countdown.initial_period, Ticks::from_millis(500));

        assert_eq!(config.lines.len(), 2);
        assert_eq!(config.lines[0].id, LineId(0));
        assert_eq!(config.lines[0].pin.pin, 25);
        assert_eq!(config.lines[0].initial, Level::Low);
        assert!(config.lines[1].pin.inverted);
        assert_eq!(config.lines[1].initial, Level::High);

        let button = config.control.button.unwrap();
        assert_eq!(button.pin, 14);
        assert!(button.pull_up);
        assert_eq!(config.control.debounce_ms, 30);

        assert_eq!(config.tables.len(), 2);
        let pulse = config.find_table("pulse").unwrap();
        assert!(!pulse.autostart);
        assert_eq!(
            pulse.events.as_slice(),
            &[
                Event::high(Ticks::from_millis(100), LineId(0)),
                Event::low(Ticks::from_millis(150), LineId(0)),
                Event::end(Ticks::from_millis(150)),
            ]
        );

        let blink = config.autostart_table().unwrap();
        assert_eq!(blink.name.as_str(), "blink");
        assert_eq!(blink.events.len(), 3);
        assert_eq!(blink.events[1].time, Ticks::from_millis(400));
        assert_eq!(blink.events[2].opcode, Opcode::Restart);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = parse_config("[line.2]\npin = \"gpio2\"\n").unwrap();
        assert_eq!(config.countdown, CountdownConfig::default());
        assert_eq!(config.control, ControlConfig::default());
        assert_eq!(config.lines[0].id, LineId(2));
        assert!(config.tables.is_empty());
    }

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        let pin = parse_pin("\"^!gpio5\"").unwrap();
        assert_eq!(pin.pin, 5);
        assert!(pin.inverted);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("pin11"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpio"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_parse_section_header() {
        assert!(matches!(
            parse_section_header("countdown"),
            Ok(Section::Countdown)
        ));
        match parse_section_header("table.blink").unwrap() {
            Section::Table(t) => assert_eq!(t.name.as_str(), "blink"),
            _ => panic!("Wrong section type"),
        }
        match parse_section_header("line.3").unwrap() {
            Section::Line(l) => assert_eq!(l.id, LineId(3)),
            _ => panic!("Wrong section type"),
        }
        assert!(matches!(
            parse_section_header("line.x"),
            Err(ParseError::InvalidSection)
        ));
        assert!(matches!(
            parse_section_header("stepper.spin"),
            Err(ParseError::InvalidSection)
        ));
    }

    #[test]
    fn test_event_errors() {
        let missing_line = "[table.t]\nevents = [{ at_ms = 1, op = \"high\" }]\n";
        assert_eq!(parse_config(missing_line), Err(ParseError::MissingField));

        let missing_time = "[table.t]\nevents = [{ op = \"end\" }]\n";
        assert_eq!(parse_config(missing_time), Err(ParseError::MissingField));

        let bad_op = "[table.t]\nevents = [{ at_ms = 1, op = \"toggle\", line = 0 }]\n";
        assert_eq!(parse_config(bad_op), Err(ParseError::InvalidValue));

        let open = "[table.t]\nevents = [\n { at_ms = 1, op = \"end\" },\n";
        assert_eq!(parse_config(open), Err(ParseError::UnterminatedArray));
    }

    #[test]
    fn test_out_of_range_times() {
        let huge_event = "[table.t]\nevents = [{ at_ms = 18446744073709552, op = \"end\" }]\n";
        assert_eq!(parse_config(huge_event), Err(ParseError::InvalidValue));

        let huge_period = "[countdown]\ninitial_period_ms = 18446744073709551615\n";
        assert_eq!(parse_config(huge_period), Err(ParseError::InvalidValue));

        let max_us = "[table.t]\nevents = [{ at_us = 18446744073709551615, op = \"end\" }]\n";
        let config = parse_config(max_us).unwrap();
        assert_eq!(config.tables[0].events[0].time, Ticks::from_ticks(u64::MAX));
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("a = 1 # note"), "a = 1 ");
        assert_eq!(strip_comment("name = \"#1\""), "name = \"#1\"");
        assert_eq!(bracket_depth("events = [ # [\n"), 1);
    }
}
