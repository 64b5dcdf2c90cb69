//! Position reconciliation
//!
//! Replaces the driver's open-loop step count with the encoder-measured
//! position while the axis is at rest.

pub mod reconciler;

pub use reconciler::{AxisSample, Correction, CorrectionOutcome, PositionSnapshot, Reconciler};
