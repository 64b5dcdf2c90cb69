//! Stepper driver implementations

pub mod accel;
pub mod output;

pub use accel::AccelStepper;
pub use output::{FourPhase, StepDir, StepDirection, StepOutput};
