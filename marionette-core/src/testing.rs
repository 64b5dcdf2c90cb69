//! Test doubles for the axis traits

use crate::traits::{AxisDriver, AxisEncoder, AxisError};

/// Driver that moves one step per `run()` and records every call
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub position: i32,
    pub target: i32,
    pub acceleration: f32,
    pub max_speed: f32,
    pub moves: Vec<i32>,
    pub overwrites: Vec<i32>,
    pub accelerations: Vec<f32>,
    pub runs: usize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AxisDriver for FakeDriver {
    fn move_to(&mut self, target: i32) {
        self.moves.push(target);
        self.target = target;
    }

    fn run(&mut self, _now_us: u64) -> Result<bool, AxisError> {
        self.runs += 1;
        if self.position < self.target {
            self.position += 1;
        } else if self.position > self.target {
            self.position -= 1;
        }
        Ok(self.distance_to_go() != 0)
    }

    fn distance_to_go(&self) -> i32 {
        self.target - self.position
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn target_position(&self) -> i32 {
        self.target
    }

    fn set_current_position(&mut self, position: i32) {
        self.overwrites.push(position);
        self.position = position;
        self.target = position;
    }

    fn set_acceleration(&mut self, steps_per_s2: f32) {
        self.accelerations.push(steps_per_s2);
        self.acceleration = steps_per_s2;
    }

    fn set_max_speed(&mut self, steps_per_s: f32) {
        self.max_speed = steps_per_s;
    }
}

/// Encoder whose count is set directly by the test
#[derive(Debug, Default)]
pub struct FakeEncoder {
    pub ticks: i32,
    pub reads: usize,
    pub fail: bool,
}

impl FakeEncoder {
    pub fn at(ticks: i32) -> Self {
        Self {
            ticks,
            ..Default::default()
        }
    }
}

impl AxisEncoder for FakeEncoder {
    fn read(&mut self) -> Result<i32, AxisError> {
        self.reads += 1;
        if self.fail {
            return Err(AxisError::Input);
        }
        Ok(self.ticks)
    }
}
