//! Acceleration-limited stepper driver
//!
//! Classic step-interval ramp (D. Austin, "Generate stepper-motor speed
//! profiles in real time", 2005). The first interval is
//!
//! ```text
//! c0 = 0.676 · √(2 / a) · 10⁶ µs
//! ```
//!
//! and every following one is `cn = cn−1 − 2·cn−1 / (4n + 1)`, floored at
//! `cmin = 10⁶ / max_speed`. A negative `n` runs the same recurrence
//! backwards to decelerate. The ramp is recomputed after every step, so at
//! most one step is emitted per `run()` and the caller must poll at least
//! once per step interval.
//!
//! Time is supplied by the caller in microseconds.

use marionette_core::traits::{AxisDriver, AxisError};

use super::output::{StepDirection, StepOutput};

/// Stepper driver with trapezoidal speed profile
pub struct AccelStepper<O> {
    output: O,
    /// Open-loop position in steps
    position: i32,
    /// Commanded position in steps
    target: i32,
    /// Signed speed in steps/s
    speed: f32,
    /// Speed limit in steps/s
    max_speed: f32,
    /// Acceleration in steps/s²
    acceleration: f32,
    /// Current step interval in µs (0 = stopped)
    step_interval_us: u64,
    /// Timestamp of the last emitted step
    last_step_us: u64,
    /// Ramp step counter (negative while decelerating)
    n: i32,
    /// Initial step interval in µs
    c0: f32,
    /// Last step interval in µs
    cn: f32,
    /// Minimum step interval in µs
    cmin: f32,
    direction: StepDirection,
}

impl<O: StepOutput> AccelStepper<O> {
    /// Create a driver at position 0
    ///
    /// Speed and acceleration start at 1 step/s and 1 step/s²; callers are
    /// expected to set both before moving. `max_speed` starts at 0 so the
    /// first `set_max_speed()` always programs `cmin`.
    pub fn new(output: O) -> Self {
        let mut stepper = Self {
            output,
            position: 0,
            target: 0,
            speed: 0.0,
            max_speed: 0.0,
            acceleration: 0.0,
            step_interval_us: 0,
            last_step_us: 0,
            n: 0,
            c0: 0.0,
            cn: 0.0,
            cmin: 0.0,
            direction: StepDirection::CounterClockwise,
        };
        stepper.set_acceleration(1.0);
        stepper.set_max_speed(1.0);
        stepper
    }

    /// Step output reference
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Mutable step output reference
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Current signed speed in steps/s
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed limit in steps/s
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Acceleration in steps/s²
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Check if the motor is still moving or has distance to cover
    pub fn is_running(&self) -> bool {
        self.speed != 0.0 || self.distance_to_go() != 0
    }

    /// De-energise the motor
    pub fn disable_outputs(&mut self) -> Result<(), AxisError> {
        self.output.release()
    }

    /// Emit a step if the current interval has elapsed
    fn run_speed(&mut self, now_us: u64) -> Result<bool, AxisError> {
        if self.step_interval_us == 0 {
            return Ok(false);
        }
        if now_us.wrapping_sub(self.last_step_us) < self.step_interval_us {
            return Ok(false);
        }

        let next = match self.direction {
            StepDirection::Clockwise => self.position.wrapping_add(1),
            StepDirection::CounterClockwise => self.position.wrapping_sub(1),
        };
        self.output.step(next, self.direction)?;
        self.position = next;
        self.last_step_us = now_us;
        Ok(true)
    }

    /// Recompute the step interval after a step or a new target
    fn compute_new_speed(&mut self) {
        let distance = self.distance_to_go();
        let steps_to_stop = ((self.speed * self.speed) / (2.0 * self.acceleration)) as i32;

        if distance == 0 && steps_to_stop <= 1 {
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance > 0 {
            if self.n > 0 {
                if steps_to_stop >= distance || self.direction == StepDirection::CounterClockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < distance
                && self.direction == StepDirection::Clockwise
            {
                self.n = -self.n;
            }
        } else if distance < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance || self.direction == StepDirection::Clockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < -distance
                && self.direction == StepDirection::CounterClockwise
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            self.cn = self.c0;
            self.direction = if distance > 0 {
                StepDirection::Clockwise
            } else {
                StepDirection::CounterClockwise
            };
        } else {
            self.cn -= (2.0 * self.cn) / ((4.0 * self.n as f32) + 1.0);
            if self.cn < self.cmin {
                self.cn = self.cmin;
            }
        }
        self.n += 1;
        self.step_interval_us = self.cn as u64;
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == StepDirection::CounterClockwise {
            self.speed = -self.speed;
        }
    }
}

impl<O: StepOutput> AxisDriver for AccelStepper<O> {
    fn move_to(&mut self, target: i32) {
        if self.target != target {
            self.target = target;
            self.compute_new_speed();
        }
    }

    fn run(&mut self, now_us: u64) -> Result<bool, AxisError> {
        if self.run_speed(now_us)? {
            self.compute_new_speed();
        }
        Ok(self.is_running())
    }

    fn distance_to_go(&self) -> i32 {
        self.target.wrapping_sub(self.position)
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn target_position(&self) -> i32 {
        self.target
    }

    fn set_current_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    fn set_acceleration(&mut self, steps_per_s2: f32) {
        if steps_per_s2 == 0.0 {
            return;
        }
        let acceleration = if steps_per_s2 < 0.0 {
            -steps_per_s2
        } else {
            steps_per_s2
        };
        if self.acceleration != acceleration {
            // Keep the ramp position at the same speed under the new rate
            self.n = (self.n as f32 * (self.acceleration / acceleration)) as i32;
            self.c0 = 0.676 * libm::sqrtf(2.0 / acceleration) * 1_000_000.0;
            self.acceleration = acceleration;
            self.compute_new_speed();
        }
    }

    fn set_max_speed(&mut self, steps_per_s: f32) {
        if steps_per_s == 0.0 {
            return;
        }
        let speed = if steps_per_s < 0.0 {
            -steps_per_s
        } else {
            steps_per_s
        };
        if self.max_speed != speed {
            self.max_speed = speed;
            self.cmin = 1_000_000.0 / speed;
            if self.n > 0 {
                self.n = ((self.speed * self.speed) / (2.0 * self.acceleration)) as i32;
                self.compute_new_speed();
            }
        }
    }
}
