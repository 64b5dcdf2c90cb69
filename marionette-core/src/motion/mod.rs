//! Axis identity and per-axis storage

pub mod axis;

pub use axis::{Axis, AxisPair};
