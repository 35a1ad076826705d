//! HPT - High Precision Timer event sequencer firmware
//!
//! Runs event tables from `sequencer.toml` on an RP2040: every event is
//! an absolute timestamp plus an output opcode, executed from a single
//! re-armable countdown.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hpt_core::config::{
    parse_config, Level, LineConfig, PinConfig, SequencerConfig, MAX_LINES,
};
use hpt_core::output::OutputLines;
use hpt_core::{LineId, Sequencer};
use hpt_hal_rp2040::{CountdownRunner, PinBank, SignalCountdown};

mod channels;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit sequencer.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../sequencer.toml");

/// Heartbeat interval of the main task
const HEARTBEAT_SECS: u64 = 60;

/// Output bank sized for the configured lines
pub type Lines = OutputLines<Output<'static>, MAX_LINES>;

/// The sequencer as shared between tasks
pub type FwSequencer = Sequencer<
    'static,
    CriticalSectionRawMutex,
    SignalCountdown<'static, CriticalSectionRawMutex>,
    Lines,
>;

// Must live forever: tables borrow their events from the config
static CONFIG: StaticCell<SequencerConfig> = StaticCell::new();
static SEQUENCER: StaticCell<FwSequencer> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("HPT sequencer starting...");

    let p = embassy_rp::init(Default::default());
    let mut pins = PinBank::new(p);
    info!("Peripherals initialized");

    let config: &'static SequencerConfig = CONFIG.init(load_config());

    let lines = init_lines(config, &mut pins);
    info!("{} output lines configured", lines.len());

    let countdown = SignalCountdown::new(
        config.countdown.name.as_str(),
        config.countdown.initial_period,
        &channels::COUNTDOWN_CMD,
    );
    let sequencer: &'static FwSequencer = SEQUENCER.init(Sequencer::new(countdown, lines));

    let runner = CountdownRunner::new(&channels::COUNTDOWN_CMD, channels::EXPIRY_CHANNEL.sender());

    // Spawn tasks
    spawner.spawn(tasks::countdown_task(runner)).unwrap();
    spawner.spawn(tasks::sequencer_task(sequencer)).unwrap();

    if let Some(button) = config.control.button {
        match pins.input(&button) {
            Ok(input) => {
                let button_config = tasks::ButtonConfig {
                    debounce_ms: config.control.debounce_ms,
                    // A pulled-up switch pulls to ground when pressed; `!` flips it
                    active_low: button.pull_up != button.inverted,
                    default_table: default_table(config),
                };
                spawner
                    .spawn(tasks::button_task(input, sequencer, button_config))
                    .unwrap();
            }
            Err(e) => error!("Button gpio{} unavailable: {:?}", button.pin, e),
        }
    }

    info!("All tasks spawned, firmware running");

    if let Some(table) = config.autostart_table() {
        match table.table() {
            Ok(t) => {
                info!("Autostarting table '{}'", table.name.as_str());
                sequencer.start(t);
            }
            Err(e) => error!("Table '{}' not started: {:?}", table.name.as_str(), e),
        }
    }

    loop {
        embassy_time::Timer::after_secs(HEARTBEAT_SECS).await;
        info!("Heartbeat: {:?}", sequencer.status());
    }
}

/// Parse and validate the embedded configuration
///
/// Falls back to a minimal configuration if the embedded TOML is broken,
/// which should only happen during development.
fn load_config() -> SequencerConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            return fallback_config();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!(
                "Parsed embedded configuration: {} lines, {} tables",
                config.lines.len(),
                config.tables.len()
            );
            config
        }
        Err(e) => {
            error!("Invalid embedded config: {:?}", e);
            fallback_config()
        }
    }
}

/// On-board LED as line 0, no tables
fn fallback_config() -> SequencerConfig {
    warn!("Using minimal fallback configuration");

    let mut config = SequencerConfig::new();
    let led = LineConfig {
        id: LineId(0),
        pin: PinConfig {
            pin: 25,
            ..Default::default()
        },
        initial: Level::Low,
    };
    let _ = config.lines.push(led);
    config
}

/// Claim each line's pin and register it in the output bank
fn init_lines(config: &SequencerConfig, pins: &mut PinBank) -> Lines {
    let mut lines = Lines::new();

    for line in &config.lines {
        let pin = match pins.output(line) {
            Ok(pin) => pin,
            Err(e) => {
                error!("Line {}: {:?}", line.id.0, e);
                continue;
            }
        };
        if let Err(e) = lines.add(line.id, pin, line.pin.inverted, line.initial.is_high()) {
            error!("Line {}: {:?}", line.id.0, e);
        }
    }

    lines
}

/// Table the button starts when nothing has run yet
fn default_table(config: &'static SequencerConfig) -> Option<hpt_core::Table<'static>> {
    config
        .autostart_table()
        .or_else(|| config.tables.first())
        .and_then(|t| t.table().ok())
}
