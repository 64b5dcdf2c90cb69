//! Main-loop controller
//!
//! Each `tick()` is one main-loop iteration, in this order:
//!
//! 1. Stage completion check, and possibly a stage advance
//! 2. One `run()` per axis driver
//! 3. Encoder poll, refreshing the cached measured positions
//!
//! The controller is single-threaded and never blocks. Timestamps come
//! from the caller, so tests drive it with a fake clock.

use super::events::{Events, PuppetEvent};
use crate::config::{Choreography, ConfigError, PuppetConfig};
use crate::motion::{Axis, AxisPair};
use crate::reconcile::{AxisSample, CorrectionOutcome, PositionSnapshot, Reconciler};
use crate::sequencer::{Action, Sequencer, SequencerState, Stage};
use crate::traits::{AxisDriver, AxisEncoder, AxisError};
use crate::units::ConversionRatio;

/// One joint: its driver, its encoder and cached tracking state
#[derive(Debug)]
pub struct AxisChannel<D, E> {
    driver: D,
    encoder: E,
    /// Last polarity-corrected encoder reading
    measured_ticks: i32,
    /// Encoder position the last pose aimed for (closed-loop only)
    target_ticks: Option<i32>,
    /// Acceleration currently programmed into the driver
    acceleration: f32,
}

impl<D: AxisDriver, E: AxisEncoder> AxisChannel<D, E> {
    /// Pair a driver with its encoder
    pub fn new(driver: D, encoder: E) -> Self {
        Self {
            driver,
            encoder,
            measured_ticks: 0,
            target_ticks: None,
            acceleration: 0.0,
        }
    }

    /// Driver reference
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver reference
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Encoder reference
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Mutable encoder reference
    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }

    /// Last polarity-corrected encoder reading
    pub fn measured_ticks(&self) -> i32 {
        self.measured_ticks
    }

    /// Encoder target of the last pose, if closed-loop
    pub fn target_ticks(&self) -> Option<i32> {
        self.target_ticks
    }

    /// Acceleration currently programmed into the driver
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Cached encoder reading alongside the driver position
    pub fn sample(&self) -> AxisSample {
        AxisSample {
            encoder_ticks: self.measured_ticks,
            driver_steps: self.driver.current_position(),
        }
    }
}

/// Two-axis puppet controller
pub struct Puppet<D, E> {
    config: PuppetConfig,
    ratio: ConversionRatio,
    axes: AxisPair<AxisChannel<D, E>>,
    sequencer: Sequencer,
    reconciler: Reconciler,
}

impl<D: AxisDriver, E: AxisEncoder> Puppet<D, E> {
    /// Create a controller and program both drivers
    ///
    /// Both drivers get the configured speed and acceleration and their
    /// step counters are zeroed: the power-on pose is the origin.
    pub fn new(
        config: PuppetConfig,
        choreography: Choreography,
        axes: AxisPair<AxisChannel<D, E>>,
    ) -> Result<Self, ConfigError> {
        let ratio = config.validate()?;
        choreography.validate()?;

        let mut axes = axes;
        for axis in Axis::ALL {
            let channel = &mut axes[axis];
            channel.driver.set_max_speed(config.run_speed);
            channel.driver.set_acceleration(config.acceleration);
            channel.driver.set_current_position(0);
            channel.acceleration = config.acceleration;
        }

        Ok(Self {
            config,
            ratio,
            axes,
            sequencer: Sequencer::new(choreography, config.looping, config.loop_cooldown_ms),
            reconciler: Reconciler::new(ratio, config.max_correction_steps),
        })
    }

    /// Puppet configuration
    pub fn config(&self) -> &PuppetConfig {
        &self.config
    }

    /// Conversion ratio in use
    pub fn ratio(&self) -> &ConversionRatio {
        &self.ratio
    }

    /// Sequencer state
    pub fn state(&self) -> &SequencerState {
        self.sequencer.state()
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.sequencer.stage()
    }

    /// One axis
    pub fn axis(&self, axis: Axis) -> &AxisChannel<D, E> {
        &self.axes[axis]
    }

    /// One axis, mutably
    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisChannel<D, E> {
        &mut self.axes[axis]
    }

    /// Check if both axes are at rest at their targets
    pub fn at_rest(&self) -> bool {
        self.axes.all(|channel| channel.driver.is_at_rest())
    }

    /// Cached encoder readings and driver positions of both axes
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            samples: self.axes.as_ref().map(|_, channel| channel.sample()),
        }
    }

    /// Enter stage 0
    ///
    /// The sequencer starts even if the first encoder poll fails; `tick()`
    /// keeps polling afterwards.
    pub fn start(&mut self, now_us: u64) -> Result<Events, AxisError> {
        let mut events = Events::new();
        let actions = self.sequencer.start(now_us / 1000);
        self.execute(&actions, &mut events)?;
        self.poll_encoders()?;
        Ok(events)
    }

    /// Run one main-loop iteration
    pub fn tick(&mut self, now_us: u64) -> Result<Events, AxisError> {
        let mut events = Events::new();

        let actions = self.sequencer.tick(now_us / 1000, self.at_rest());
        self.execute(&actions, &mut events)?;

        for axis in Axis::ALL {
            self.axes[axis].driver.run(now_us)?;
        }

        self.poll_encoders()?;

        Ok(events)
    }

    /// Read both encoders into the cache
    fn poll_encoders(&mut self) -> Result<(), AxisError> {
        for axis in Axis::ALL {
            let channel = &mut self.axes[axis];
            let raw = channel.encoder.read()?;
            channel.measured_ticks = self.config.encoder_polarity(raw);
        }
        Ok(())
    }

    /// Carry out sequencer actions in order
    fn execute(&mut self, actions: &[Action], events: &mut Events) -> Result<(), AxisError> {
        for action in actions {
            match *action {
                Action::Reconcile => {
                    if self.config.is_closed_loop() {
                        self.reconcile(events)?;
                    }
                }
                Action::EnterStage(stage) => {
                    let label = self
                        .sequencer
                        .pose(stage)
                        .map(|pose| pose.label.clone())
                        .unwrap_or_default();
                    let _ = events.push(PuppetEvent::StageEntered { stage, label });
                }
                Action::ApplyPose(stage) => {
                    self.apply_pose(stage);
                    let _ = events.push(PuppetEvent::PoseApplied(stage));
                }
                Action::BeginCooldown { resume_at_ms } => {
                    let _ = events.push(PuppetEvent::CooldownStarted { resume_at_ms });
                }
                Action::Halt => {
                    let _ = events.push(PuppetEvent::Halted);
                }
            }
        }
        Ok(())
    }

    /// Overwrite both open-loop positions with fresh encoder readings
    fn reconcile(&mut self, events: &mut Events) -> Result<(), AxisError> {
        self.poll_encoders()?;
        let before = self.snapshot();

        for axis in Axis::ALL {
            let channel = &mut self.axes[axis];
            let correction =
                self.reconciler
                    .correct(axis, &mut channel.driver, channel.measured_ticks);
            if correction.outcome == CorrectionOutcome::Rejected {
                let _ = events.push(PuppetEvent::CorrectionRejected(correction));
            }
        }

        let after = self.snapshot();
        let _ = events.push(PuppetEvent::Reconciled { before, after });
        Ok(())
    }

    /// Issue a stage's pose to the axes
    ///
    /// Axes without a target keep their current target. Acceleration
    /// overrides last for this stage only: any axis without an override
    /// goes back to the configured default.
    fn apply_pose(&mut self, stage: u8) {
        let Some(pose) = self.sequencer.pose(stage) else {
            return;
        };
        let closed_loop = self.config.is_closed_loop();

        for axis in Axis::ALL {
            let channel = &mut self.axes[axis];

            if let Some(degrees) = pose.target(axis) {
                channel.driver.move_to(self.ratio.degrees_to_steps(degrees));
                if closed_loop {
                    channel.target_ticks = Some(self.ratio.degrees_to_ticks(degrees));
                }
            }

            let acceleration = pose.acceleration[axis].unwrap_or(self.config.acceleration);
            if acceleration != channel.acceleration {
                channel.driver.set_acceleration(acceleration);
                channel.acceleration = acceleration;
            }
        }
    }
}
