//! Build script for hpt-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates sequencer.toml at compile time

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x in OUT_DIR");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    countdown: Option<Countdown>,
    #[serde(default)]
    line: BTreeMap<String, Line>,
    control: Option<Control>,
    #[serde(default)]
    table: BTreeMap<String, TableDef>,
}

#[derive(Deserialize)]
struct Countdown {
    name: Option<String>,
    initial_period_ms: Option<u64>,
}

#[derive(Deserialize)]
struct Line {
    pin: String,
    initial: Option<String>,
}

#[derive(Deserialize)]
struct Control {
    button: Option<String>,
    debounce_ms: Option<u32>,
}

#[derive(Deserialize)]
struct TableDef {
    #[serde(default)]
    autostart: bool,
    events: Vec<EventDef>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EventDef {
    at_ms: Option<u64>,
    at_us: Option<u64>,
    op: String,
    line: Option<u8>,
}

impl EventDef {
    fn time_us(&self) -> Option<u64> {
        match (self.at_ms, self.at_us) {
            (Some(ms), None) => ms.checked_mul(1000),
            (None, Some(us)) => Some(us),
            _ => None,
        }
    }
}

/// Validate sequencer.toml configuration at compile time
fn validate_config() {
    // Re-run if sequencer.toml changes
    println!("cargo:rerun-if-changed=sequencer.toml");

    let config_path = Path::new("sequencer.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read sequencer.toml", &[e.to_string()]),
    };

    let config: Config = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => fail(
            "Invalid sequencer.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_countdown(&config, &mut errors);
    let lines = validate_lines(&config, &mut errors);
    validate_tables(&config, &lines, &mut errors);

    if !errors.is_empty() {
        fail("Invalid sequencer configuration", &errors);
    }

    println!("cargo:warning=sequencer.toml validated successfully");
}

fn validate_countdown(config: &Config, errors: &mut Vec<String>) {
    if let Some(countdown) = &config.countdown {
        if let Some(name) = &countdown.name {
            if name.len() > 16 {
                errors.push("[countdown] name is longer than 16 bytes".into());
            }
        }
        if countdown.initial_period_ms == Some(0) {
            errors.push("[countdown] initial_period_ms must be non-zero".into());
        }
    }
    if let Some(control) = &config.control {
        if control.debounce_ms == Some(0) {
            errors.push("[control] debounce_ms must be non-zero".into());
        }
    }
}

/// Check line sections and return the configured line ids
fn validate_lines(config: &Config, errors: &mut Vec<String>) -> Vec<u8> {
    let mut ids = Vec::new();
    let mut pins = Vec::new();

    if config.line.len() > 8 {
        errors.push(format!("{} lines configured, at most 8 allowed", config.line.len()));
    }

    for (name, line) in &config.line {
        match name.parse::<u8>() {
            Ok(id) => ids.push(id),
            Err(_) => errors.push(format!("[line.{}] id must be a number 0-255", name)),
        }

        match parse_pin(&line.pin) {
            Some(pin) if pins.contains(&pin) => {
                errors.push(format!("[line.{}] gpio{} is already in use", name, pin))
            }
            Some(pin) => pins.push(pin),
            None => errors.push(format!("[line.{}] invalid pin '{}'", name, line.pin)),
        }

        if let Some(initial) = &line.initial {
            if !["low", "high"].contains(&initial.as_str()) {
                errors.push(format!("[line.{}] initial must be 'low' or 'high'", name));
            }
        }
    }

    if let Some(button) = config.control.as_ref().and_then(|c| c.button.as_ref()) {
        match parse_pin(button) {
            Some(pin) if pins.contains(&pin) => {
                errors.push(format!("[control] button gpio{} is already in use", pin))
            }
            Some(_) => {}
            None => errors.push(format!("[control] invalid button pin '{}'", button)),
        }
    }

    ids
}

fn validate_tables(config: &Config, lines: &[u8], errors: &mut Vec<String>) {
    if config.table.len() > 4 {
        errors.push(format!("{} tables configured, at most 4 allowed", config.table.len()));
    }

    let autostart = config.table.values().filter(|t| t.autostart).count();
    if autostart > 1 {
        errors.push(format!("{} tables have autostart = true, at most 1 allowed", autostart));
    }

    for (name, table) in &config.table {
        if name.len() > 16 {
            errors.push(format!("[table.{}] name is longer than 16 bytes", name));
        }
        if table.events.is_empty() {
            errors.push(format!("[table.{}] events cannot be empty", name));
            continue;
        }
        if table.events.len() > 32 {
            errors.push(format!("[table.{}] has more than 32 events", name));
        }

        let mut previous = 0;
        for (i, event) in table.events.iter().enumerate() {
            match event.time_us() {
                Some(t) if t < previous => errors.push(format!(
                    "[table.{}] event {} is earlier than the event before it",
                    name, i
                )),
                Some(t) => previous = t,
                None => errors.push(format!(
                    "[table.{}] event {} needs exactly one in-range at_ms / at_us",
                    name, i
                )),
            }

            match event.op.as_str() {
                "high" | "low" => match event.line {
                    Some(line) if !lines.contains(&line) => errors.push(format!(
                        "[table.{}] event {} drives unconfigured line {}",
                        name, i, line
                    )),
                    Some(_) => {}
                    None => errors.push(format!("[table.{}] event {} missing 'line'", name, i)),
                },
                "end" | "restart" => {}
                other => errors.push(format!(
                    "[table.{}] event {} has unknown op '{}'",
                    name, i, other
                )),
            }
        }

        let terminated = table
            .events
            .last()
            .map(|e| e.op == "end" || e.op == "restart")
            .unwrap_or(false);
        if !terminated {
            errors.push(format!(
                "[table.{}] last event must be 'end' or 'restart'",
                name
            ));
        }
    }
}

/// Parse "gpio25" with optional `!`/`^` modifiers
fn parse_pin(s: &str) -> Option<u8> {
    let s = s.trim_start_matches(['!', '^']);
    let pin: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    (pin < 30).then_some(pin)
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.chars().count() > 62 {
                format!("{}...", line.chars().take(59).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
