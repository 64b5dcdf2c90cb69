//! Puppet configuration type definitions
//!
//! These values are fixed for the lifetime of the firmware. Defaults match a
//! 28BYJ-48 geared stepper (2048 full steps per output revolution) driven at
//! a slow, even pace.

use crate::units::ConversionRatio;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default motor steps per joint revolution
pub const DEFAULT_STEPS_PER_REVOLUTION: u32 = 2048;

/// Default encoder ticks per joint revolution (1000 PPR, x4 decoding)
pub const DEFAULT_TICKS_PER_REVOLUTION: u32 = 4000;

/// Default run speed in steps/s
pub const DEFAULT_RUN_SPEED: f32 = 50.0;

/// Default acceleration in steps/s²
pub const DEFAULT_ACCELERATION: f32 = 50.0;

/// Default pause before restarting a looping choreography
pub const DEFAULT_LOOP_COOLDOWN_MS: u32 = 10_000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Steps or ticks per revolution is zero
    InvalidRatio,
    /// Run speed is not a positive number
    InvalidSpeed,
    /// Acceleration is not a positive number
    InvalidAcceleration,
    /// Choreography has no stages
    EmptyChoreography,
    /// Choreography exceeds the stage table capacity
    TooManyStages,
}

/// How the open-loop step count is kept in line with reality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingMode {
    /// Trust commanded steps; encoders are polled for diagnostics only
    OpenLoop,
    /// Overwrite the step count with the encoder reading at each stage boundary
    #[default]
    ClosedLoop,
}

/// Puppet-wide settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PuppetConfig {
    /// Motor steps per joint revolution
    pub steps_per_revolution: u32,
    /// Encoder ticks per joint revolution
    pub ticks_per_revolution: u32,
    /// Maximum speed in steps/s
    pub run_speed: f32,
    /// Default acceleration in steps/s² (poses may override per stage)
    pub acceleration: f32,
    /// Restart from stage 0 after the last stage instead of halting
    pub looping: bool,
    /// Wait before restarting when looping
    pub loop_cooldown_ms: u32,
    /// Position tracking model
    pub tracking: TrackingMode,
    /// Encoders count opposite to the driver's positive direction
    pub invert_encoders: bool,
    /// Largest correction the reconciler will apply (None = always trust encoder)
    pub max_correction_steps: Option<u32>,
}

impl Default for PuppetConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: DEFAULT_STEPS_PER_REVOLUTION,
            ticks_per_revolution: DEFAULT_TICKS_PER_REVOLUTION,
            run_speed: DEFAULT_RUN_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            looping: false,
            loop_cooldown_ms: DEFAULT_LOOP_COOLDOWN_MS,
            tracking: TrackingMode::ClosedLoop,
            invert_encoders: true,
            max_correction_steps: None,
        }
    }
}

impl PuppetConfig {
    /// Validate the settings and derive the conversion ratio
    pub fn validate(&self) -> Result<ConversionRatio, ConfigError> {
        // `!(x > 0.0)` also rejects NaN
        if !(self.run_speed > 0.0) {
            return Err(ConfigError::InvalidSpeed);
        }
        if !(self.acceleration > 0.0) {
            return Err(ConfigError::InvalidAcceleration);
        }
        ConversionRatio::new(self.steps_per_revolution, self.ticks_per_revolution)
    }

    /// Whether stage boundaries reconcile against the encoders
    pub fn is_closed_loop(&self) -> bool {
        self.tracking == TrackingMode::ClosedLoop
    }

    /// Apply the configured encoder polarity to a raw reading
    pub fn encoder_polarity(&self, raw_ticks: i32) -> i32 {
        if self.invert_encoders {
            raw_ticks.wrapping_neg()
        } else {
            raw_ticks
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PuppetConfig::default();
        let ratio = config.validate().unwrap();
        assert_eq!(ratio.steps_per_revolution(), 2048);
        assert_eq!(ratio.ticks_per_revolution(), 4000);
        assert!(!config.looping);
        assert!(config.is_closed_loop());
        assert!(config.max_correction_steps.is_none());
    }

    #[test]
    fn test_invalid_speed() {
        let config = PuppetConfig {
            run_speed: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed));

        let config = PuppetConfig {
            run_speed: f32::NAN,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed));
    }

    #[test]
    fn test_invalid_acceleration() {
        let config = PuppetConfig {
            acceleration: -5.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidAcceleration));
    }

    #[test]
    fn test_invalid_ratio() {
        let config = PuppetConfig {
            ticks_per_revolution: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRatio));
    }

    #[test]
    fn test_encoder_polarity() {
        let inverted = PuppetConfig::default();
        assert_eq!(inverted.encoder_polarity(4000), -4000);
        assert_eq!(inverted.encoder_polarity(-12), 12);

        let direct = PuppetConfig {
            invert_encoders: false,
            ..Default::default()
        };
        assert_eq!(direct.encoder_polarity(4000), 4000);
    }
}
