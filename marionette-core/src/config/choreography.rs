//! Choreography table
//!
//! A choreography is an ordered list of poses. Stage `n` of the sequencer
//! executes pose `n`. Poses are plain data: absolute joint angles, a
//! settle delay and optional per-stage acceleration overrides.

use heapless::{String, Vec};

use super::types::ConfigError;
use crate::motion::{Axis, AxisPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum number of stages in a choreography
pub const MAX_STAGES: usize = 32;

/// One stage of the choreography
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseCommand {
    /// Short human-readable name
    pub label: String<MAX_LABEL_LEN>,
    /// Absolute target angle per axis in degrees (None = leave unchanged)
    pub target_deg: AxisPair<Option<f32>>,
    /// Settle time before the move is issued
    pub delay_ms: u32,
    /// Acceleration override for this stage only, in steps/s²
    pub acceleration: AxisPair<Option<f32>>,
}

impl PoseCommand {
    /// Create an empty pose with a label
    ///
    /// Labels longer than [`MAX_LABEL_LEN`] are truncated.
    pub fn new(label: &str) -> Self {
        let mut s = String::new();
        for c in label.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        Self {
            label: s,
            ..Default::default()
        }
    }

    /// Set the left joint target angle
    pub fn left(mut self, degrees: f32) -> Self {
        self.target_deg.left = Some(degrees);
        self
    }

    /// Set the right joint target angle
    pub fn right(mut self, degrees: f32) -> Self {
        self.target_deg.right = Some(degrees);
        self
    }

    /// Wait before issuing the move
    pub fn after_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Override the acceleration of one axis for this stage
    pub fn with_acceleration(mut self, axis: Axis, steps_per_s2: f32) -> Self {
        self.acceleration[axis] = Some(steps_per_s2);
        self
    }

    /// Target angle for an axis, if this pose moves it
    pub fn target(&self, axis: Axis) -> Option<f32> {
        self.target_deg[axis]
    }

    /// Check if this pose moves neither axis
    pub fn is_hold(&self) -> bool {
        self.target_deg.all(Option::is_none)
    }
}

/// Ordered stage → pose table
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Choreography {
    stages: Vec<PoseCommand, MAX_STAGES>,
}

impl Choreography {
    /// Create an empty choreography
    pub const fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Build a choreography from a slice of poses
    pub fn from_poses(poses: &[PoseCommand]) -> Result<Self, ConfigError> {
        let mut choreography = Self::new();
        for pose in poses {
            choreography.push(pose.clone())?;
        }
        choreography.validate()?;
        Ok(choreography)
    }

    /// Append a stage
    pub fn push(&mut self, pose: PoseCommand) -> Result<(), ConfigError> {
        self.stages.push(pose).map_err(|_| ConfigError::TooManyStages)
    }

    /// Check the table can be sequenced
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptyChoreography);
        }
        Ok(())
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if there are no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Pose for a stage index
    pub fn get(&self, stage: u8) -> Option<&PoseCommand> {
        self.stages.get(stage as usize)
    }

    /// Iterate over the poses in stage order
    pub fn iter(&self) -> impl Iterator<Item = &PoseCommand> {
        self.stages.iter()
    }

    /// The stock thirteen-stage high-wire routine
    ///
    /// Angles are absolute, measured from the power-on pose. The routine
    /// ends with both joints back where they started except the right
    /// joint, which finishes at -20° on the high wire.
    pub fn standard() -> Self {
        use Axis::Left;

        let poses = [
            PoseCommand::new("frame").right(58.0),
            PoseCommand::new("pose 1").after_ms(2000).left(-25.0),
            PoseCommand::new("pose 2").after_ms(2000).left(-65.0).right(93.0),
            PoseCommand::new("balance").after_ms(2000).left(-85.0),
            PoseCommand::new("frame 2").after_ms(2000).left(-103.0).right(148.0),
            PoseCommand::new("stretch").after_ms(2000).left(-153.0),
            // Faster acceleration so the joint drops through under gravity
            PoseCommand::new("fall through")
                .after_ms(2000)
                .left(-173.0)
                .with_acceleration(Left, 500.0),
            PoseCommand::new("short straw").left(-153.0),
            PoseCommand::new("pose L").after_ms(2000).left(-93.0).right(133.0),
            PoseCommand::new("pose A").after_ms(2000).left(0.0).right(45.0),
            PoseCommand::new("pose V").after_ms(2000).left(-50.0).right(95.0),
            PoseCommand::new("reach high wire").after_ms(1000).right(0.0),
            PoseCommand::new("run high wire").left(0.0).right(-20.0),
        ];

        Self {
            stages: poses.into_iter().collect(),
        }
    }
}
