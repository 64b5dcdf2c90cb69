//! Unit conversion between degrees, motor steps and encoder ticks
//!
//! Two fixed ratios describe a deployment: steps per revolution (driver
//! microstepping and gearing) and ticks per revolution (encoder resolution).
//! All conversions round to the nearest integer, halves away from zero, so
//! a single move carries at most one unit of quantization error.

use crate::config::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Degrees in one joint revolution
pub const DEGREES_PER_REVOLUTION: f32 = 360.0;

/// Fixed step/tick ratio of one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConversionRatio {
    steps_per_revolution: u32,
    ticks_per_revolution: u32,
}

impl ConversionRatio {
    /// Create a ratio, rejecting zero on either side
    pub fn new(steps_per_revolution: u32, ticks_per_revolution: u32) -> Result<Self, ConfigError> {
        if steps_per_revolution == 0 || ticks_per_revolution == 0 {
            return Err(ConfigError::InvalidRatio);
        }
        Ok(Self {
            steps_per_revolution,
            ticks_per_revolution,
        })
    }

    /// Motor steps per joint revolution
    pub fn steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution
    }

    /// Encoder ticks per joint revolution
    pub fn ticks_per_revolution(&self) -> u32 {
        self.ticks_per_revolution
    }

    /// Encoder ticks per motor step
    pub fn ticks_per_step(&self) -> f32 {
        self.ticks_per_revolution as f32 / self.steps_per_revolution as f32
    }

    /// Convert an angle to an absolute step count
    pub fn degrees_to_steps(&self, degrees: f32) -> i32 {
        round_to_i32(degrees / DEGREES_PER_REVOLUTION * self.steps_per_revolution as f32)
    }

    /// Convert an angle to an absolute encoder tick count
    pub fn degrees_to_ticks(&self, degrees: f32) -> i32 {
        round_to_i32(degrees / DEGREES_PER_REVOLUTION * self.ticks_per_revolution as f32)
    }

    /// Convert encoder ticks to the equivalent step count
    ///
    /// Computed as `ticks * steps_rev / ticks_rev` in integer arithmetic,
    /// which equals `ticks / ticks_per_step` without float error.
    pub fn ticks_to_steps(&self, ticks: i32) -> i32 {
        let num = ticks as i64 * self.steps_per_revolution as i64;
        div_round(num, self.ticks_per_revolution as i64) as i32
    }

    /// Convert steps to degrees (diagnostics only)
    pub fn steps_to_degrees(&self, steps: i32) -> f32 {
        steps as f32 * DEGREES_PER_REVOLUTION / self.steps_per_revolution as f32
    }
}

/// Round half away from zero
fn round_to_i32(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

/// Integer division rounding half away from zero (`den` > 0)
fn div_round(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_ratio_rejected() {
        assert_eq!(ConversionRatio::new(0, 4000), Err(ConfigError::InvalidRatio));
        assert_eq!(ConversionRatio::new(2048, 0), Err(ConfigError::InvalidRatio));
    }

    #[test]
    fn test_degrees_to_steps_rounds_to_nearest() {
        let ratio = ConversionRatio::new(2048, 4000).unwrap();
        // 58 / 360 * 2048 = 329.96
        assert_eq!(ratio.degrees_to_steps(58.0), 330);
        assert_eq!(ratio.degrees_to_steps(-58.0), -330);
        assert_eq!(ratio.degrees_to_steps(0.0), 0);
        assert_eq!(ratio.degrees_to_steps(360.0), 2048);
    }

    #[test]
    fn test_degrees_to_ticks() {
        let ratio = ConversionRatio::new(3200, 4000).unwrap();
        assert_eq!(ratio.degrees_to_ticks(90.0), 1000);
        assert_eq!(ratio.degrees_to_ticks(-360.0), -4000);
    }

    #[test]
    fn test_ticks_to_steps() {
        let ratio = ConversionRatio::new(3200, 4000).unwrap();
        assert_eq!(ratio.ticks_per_step(), 1.25);
        assert_eq!(ratio.ticks_to_steps(-4000), -3200);
        assert_eq!(ratio.ticks_to_steps(4000), 3200);
        // 1 / 1.25 = 0.8 -> 1, 2 / 1.25 = 1.6 -> 2
        assert_eq!(ratio.ticks_to_steps(1), 1);
        assert_eq!(ratio.ticks_to_steps(2), 2);
        assert_eq!(ratio.ticks_to_steps(-1), -1);
    }

    #[test]
    fn test_ticks_to_steps_half_rounds_away_from_zero() {
        let ratio = ConversionRatio::new(1, 2).unwrap();
        assert_eq!(ratio.ticks_to_steps(1), 1);
        assert_eq!(ratio.ticks_to_steps(-1), -1);
        assert_eq!(ratio.ticks_to_steps(3), 2);
    }

    #[test]
    fn test_steps_to_degrees() {
        let ratio = ConversionRatio::new(2048, 4000).unwrap();
        assert_eq!(ratio.steps_to_degrees(512), 90.0);
    }

    proptest! {
        #[test]
        fn prop_ticks_and_steps_agree_within_one(
            degrees in -720.0f32..720.0,
            steps_rev in 200u32..10_000,
            extra_ticks in 0u32..10_000,
        ) {
            // Encoder at least as fine as the driver
            let ticks_rev = steps_rev + extra_ticks;
            let ratio = ConversionRatio::new(steps_rev, ticks_rev).unwrap();
            let via_ticks = ratio.ticks_to_steps(ratio.degrees_to_ticks(degrees));
            let direct = ratio.degrees_to_steps(degrees);
            prop_assert!((via_ticks - direct).abs() <= 1);
        }
    }
}
