//! Marionette - Two-Axis Puppet Firmware
//!
//! Main firmware binary for RP2040-based stepper puppets. Two 28BYJ-48
//! joints walk through the stage table in puppet.toml; a quadrature
//! encoder on each joint corrects the open-loop step count at every stage
//! boundary.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use marionette_core::config::{parse_config, Choreography, PuppetConfig};
use marionette_core::controller::{AxisChannel, Puppet};
use marionette_core::motion::AxisPair;
use marionette_core::sequencer::Stage;
use marionette_drivers::encoder::QuadratureEncoder;
use marionette_drivers::stepper::{AccelStepper, FourPhase};

use crate::tasks::PuppetController;

/// Embedded configuration (compiled into firmware)
/// Edit puppet.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../puppet.toml");

/// Longest gap between heartbeat log lines
const HEARTBEAT_SECS: u64 = 60;

mod channels;
mod tasks;

// Controller must live forever for the task reference
static PUPPET: StaticCell<PuppetController> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Marionette firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let (config, choreography) = load_config();
    info!(
        "Puppet config: {} steps/rev, {} ticks/rev, {} stages, tracking={}",
        config.steps_per_revolution,
        config.ticks_per_revolution,
        choreography.len(),
        config.tracking
    );

    // Coil pins in driver order (ULN2003 IN1, IN3, IN2, IN4)
    // Left: GPIO11, GPIO9, GPIO10, GPIO8
    let left_coils = FourPhase::new([
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_9, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_8, Level::Low),
    ]);
    // Right: GPIO6, GPIO4, GPIO5, GPIO3
    let right_coils = FourPhase::new([
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_4, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_3, Level::Low),
    ]);

    // Encoder A/B channels (open-collector, pulled up)
    // Left: GPIO12/GPIO13, Right: GPIO14/GPIO15
    let left_encoder = unwrap!(QuadratureEncoder::new(
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
    ));
    let right_encoder = unwrap!(QuadratureEncoder::new(
        Input::new(p.PIN_14, Pull::Up),
        Input::new(p.PIN_15, Pull::Up),
    ));
    info!("Steppers and encoders initialized");

    let axes = AxisPair::new(
        AxisChannel::new(AccelStepper::new(left_coils), left_encoder),
        AxisChannel::new(AccelStepper::new(right_coils), right_encoder),
    );

    // load_config() only returns validated settings
    let puppet = PUPPET.init(unwrap!(Puppet::new(config, choreography, axes)));

    spawner.spawn(tasks::puppet_task(puppet)).unwrap();

    info!("All tasks spawned, firmware running");

    // Report the current stage at least once a minute
    let mut stage = Stage::Index(0);
    loop {
        match select(channels::STAGE.wait(), Timer::after_secs(HEARTBEAT_SECS)).await {
            Either::First(new_stage) => stage = new_stage,
            Either::Second(_) => info!("Heartbeat: stage {}", stage.as_raw()),
        }
    }
}

/// Parse the embedded puppet.toml
///
/// Falls back to the built-in routine and default settings if the
/// embedded file does not parse. build.rs validates the file, so this only
/// happens during development.
fn load_config() -> (PuppetConfig, Choreography) {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(parsed) => {
            info!("Parsed embedded configuration successfully");
            (parsed.puppet, parsed.choreography)
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in choreography");
            (PuppetConfig::default(), Choreography::standard())
        }
    }
}
