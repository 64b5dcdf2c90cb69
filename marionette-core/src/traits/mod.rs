//! Hardware abstraction traits
//!
//! These traits define the interface between the choreography logic
//! and hardware-specific implementations.

pub mod axis;

pub use axis::{AxisDriver, AxisEncoder, AxisError};
