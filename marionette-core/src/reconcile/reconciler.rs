//! Open-loop vs. measured position reconciler
//!
//! Stepper drivers count the pulses they emit. Under load the joint can
//! slip or miss steps, so the count drifts away from where the joint really
//! is. At every stage boundary the reconciler converts the encoder reading
//! to steps and overwrites the driver's counter with it.
//!
//! Drift that builds up during a stage is only corrected at the next
//! boundary.

use core::fmt;

use crate::motion::{Axis, AxisPair};
use crate::traits::AxisDriver;
use crate::units::ConversionRatio;

/// Encoder and driver position of one axis at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSample {
    /// Polarity-corrected encoder reading
    pub encoder_ticks: i32,
    /// Driver's open-loop position
    pub driver_steps: i32,
}

/// Both axes sampled together, for the reconciliation diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSnapshot {
    pub samples: AxisPair<AxisSample>,
}

impl fmt::Display for PositionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.samples.left;
        let r = self.samples.right;
        write!(
            f,
            "Left, {}, {}, Right, {}, {}",
            l.encoder_ticks, l.driver_steps, r.encoder_ticks, r.driver_steps
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PositionSnapshot {
    fn format(&self, f: defmt::Formatter) {
        let l = self.samples.left;
        let r = self.samples.right;
        defmt::write!(
            f,
            "Left, {}, {}, Right, {}, {}",
            l.encoder_ticks,
            l.driver_steps,
            r.encoder_ticks,
            r.driver_steps
        )
    }
}

/// What happened to one axis during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CorrectionOutcome {
    /// Driver position overwritten with the measured position
    Applied,
    /// Measured position already matched the driver
    Unchanged,
    /// Correction exceeded the configured bound; driver left untouched
    Rejected,
    /// Axis was still moving; driver left untouched
    InMotion,
}

/// Result of reconciling one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Correction {
    pub axis: Axis,
    /// Polarity-corrected encoder reading
    pub measured_ticks: i32,
    /// Encoder reading converted to steps
    pub measured_steps: i32,
    /// Driver position before reconciliation
    pub open_loop_steps: i32,
    pub outcome: CorrectionOutcome,
}

impl Correction {
    /// Signed drift the correction removes (measured - open-loop)
    pub fn delta_steps(&self) -> i32 {
        self.measured_steps.wrapping_sub(self.open_loop_steps)
    }

    /// Check if the driver position was changed
    pub fn is_applied(&self) -> bool {
        self.outcome == CorrectionOutcome::Applied
    }
}

/// Encoder-to-driver position reconciler
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    ratio: ConversionRatio,
    max_correction_steps: Option<u32>,
}

impl Reconciler {
    /// Create a reconciler
    ///
    /// With `max_correction_steps = None` every encoder reading is taken as
    /// ground truth.
    pub fn new(ratio: ConversionRatio, max_correction_steps: Option<u32>) -> Self {
        Self {
            ratio,
            max_correction_steps,
        }
    }

    /// Conversion ratio used for ticks → steps
    pub fn ratio(&self) -> &ConversionRatio {
        &self.ratio
    }

    /// Reconcile one axis against a polarity-corrected encoder reading
    ///
    /// Does nothing unless the driver is at rest.
    pub fn correct<D: AxisDriver>(
        &self,
        axis: Axis,
        driver: &mut D,
        measured_ticks: i32,
    ) -> Correction {
        let measured_steps = self.ratio.ticks_to_steps(measured_ticks);
        let open_loop_steps = driver.current_position();

        let mut correction = Correction {
            axis,
            measured_ticks,
            measured_steps,
            open_loop_steps,
            outcome: CorrectionOutcome::Unchanged,
        };

        if !driver.is_at_rest() {
            correction.outcome = CorrectionOutcome::InMotion;
            return correction;
        }

        if let Some(limit) = self.max_correction_steps {
            if correction.delta_steps().unsigned_abs() > limit {
                correction.outcome = CorrectionOutcome::Rejected;
                return correction;
            }
        }

        if measured_steps != open_loop_steps {
            driver.set_current_position(measured_steps);
            correction.outcome = CorrectionOutcome::Applied;
        }

        correction
    }
}
