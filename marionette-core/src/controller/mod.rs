//! Puppet controller
//!
//! Owns both axes, the sequencer and the reconciler, and runs one main-loop
//! iteration per `tick()`.

pub mod events;
pub mod puppet;

pub use events::{Events, PuppetEvent, MAX_EVENTS};
pub use puppet::{AxisChannel, Puppet};
