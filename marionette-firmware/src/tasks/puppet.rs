//! Puppet main-loop task
//!
//! Runs the controller as fast as the executor allows: one `tick()` per
//! iteration, yielding in between so the heartbeat still gets scheduled.
//! Step timing comes from the tick timestamps, so the loop never sleeps
//! while a move is in progress.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Instant, Timer};

use marionette_core::controller::{Events, Puppet, PuppetEvent};
use marionette_core::sequencer::Stage;
use marionette_drivers::encoder::QuadratureEncoder;
use marionette_drivers::stepper::{AccelStepper, FourPhase};

use crate::channels::STAGE;

/// Coil-driven joint stepper
pub type Stepper = AccelStepper<FourPhase<Output<'static>>>;

/// Joint encoder on two GPIO inputs
pub type Encoder = QuadratureEncoder<Input<'static>, Input<'static>>;

/// Controller with the board's driver and encoder types
pub type PuppetController = Puppet<Stepper, Encoder>;

/// Back-off after a failed iteration
const ERROR_BACKOFF_MS: u64 = 100;

/// Puppet task
#[embassy_executor::task]
pub async fn puppet_task(puppet: &'static mut PuppetController) {
    info!("Puppet task started");

    match puppet.start(Instant::now().as_micros()) {
        Ok(events) => report(&events),
        Err(e) => error!("Failed to start choreography: {}", e),
    }

    loop {
        match puppet.tick(Instant::now().as_micros()) {
            Ok(events) => report(&events),
            Err(e) => {
                error!("Axis I/O failed: {}", e);
                Timer::after_millis(ERROR_BACKOFF_MS).await;
            }
        }

        yield_now().await;
    }
}

/// Log controller events and publish stage changes
fn report(events: &Events) {
    for event in events {
        match event {
            PuppetEvent::StageEntered { stage, label } => {
                info!("Stage {} ({})", stage, label.as_str());
                STAGE.signal(Stage::Index(*stage));
            }
            PuppetEvent::PoseApplied(stage) => {
                debug!("Stage {} pose issued", stage);
            }
            PuppetEvent::Reconciled { before, after } => {
                info!("Before reconciliation: {}", before);
                info!("After reconciliation: {}", after);
            }
            PuppetEvent::CorrectionRejected(c) => {
                warn!(
                    "{} correction of {} steps rejected (encoder {} ticks, driver {} steps)",
                    c.axis.name(),
                    c.delta_steps(),
                    c.measured_ticks,
                    c.open_loop_steps
                );
            }
            PuppetEvent::CooldownStarted { resume_at_ms } => {
                info!("Choreography complete, restarting at {} ms", resume_at_ms);
            }
            PuppetEvent::Halted => {
                info!("Choreography complete");
                STAGE.signal(Stage::Halted);
            }
        }
    }
}
