//! Axis driver and encoder traits
//!
//! An axis is one stepper-driven joint. The driver moves it toward an
//! absolute step target one step at a time; the encoder reports where the
//! joint physically is.

/// Errors that can occur while driving or sensing an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisError {
    /// Writing a coil, step or direction pin failed
    Output,
    /// Reading an encoder channel failed
    Input,
}

/// Trait for non-blocking, acceleration-limited stepper drivers
///
/// Implementations keep an open-loop step counter: the position is whatever
/// the driver has commanded, with no physical feedback.
pub trait AxisDriver {
    /// Set a new absolute target in steps
    ///
    /// Does not block. Motion happens incrementally on later `run()` calls.
    fn move_to(&mut self, target: i32);

    /// Advance the motion by at most one step
    ///
    /// A step is only taken if one is due at `now_us` given the current
    /// speed and acceleration profile. Calling this at the target is a
    /// no-op.
    ///
    /// # Returns
    /// `true` while the axis is still moving toward its target
    fn run(&mut self, now_us: u64) -> Result<bool, AxisError>;

    /// Signed steps remaining to the target (0 = at rest at target)
    fn distance_to_go(&self) -> i32;

    /// Current open-loop position in steps
    fn current_position(&self) -> i32;

    /// Most recently commanded absolute target in steps
    fn target_position(&self) -> i32;

    /// Overwrite the step counter without commanding motion
    ///
    /// Must only be called while the axis is at rest.
    fn set_current_position(&mut self, position: i32);

    /// Set the acceleration/deceleration rate in steps/s²
    fn set_acceleration(&mut self, steps_per_s2: f32);

    /// Set the maximum speed in steps/s
    fn set_max_speed(&mut self, steps_per_s: f32);

    /// Check if the axis is at rest at its target
    fn is_at_rest(&self) -> bool {
        self.distance_to_go() == 0
    }
}

/// Trait for free-running quadrature encoders
///
/// The count starts at zero on power-on and the controller never resets
/// it. Polarity is raw: callers invert it when the encoder counts against
/// the driver.
pub trait AxisEncoder {
    /// Read the signed cumulative tick count
    fn read(&mut self) -> Result<i32, AxisError>;
}
