//! Board-agnostic core logic for the puppet firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (axis driver, axis encoder)
//! - Unit conversion between degrees, motor steps and encoder ticks
//! - Choreography and puppet configuration types, and the puppet.toml parser
//! - Position reconciliation (open-loop vs. encoder-measured position)
//! - Stage sequencer state machine
//! - The `Puppet` controller that ties them into a main loop

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod motion;
pub mod reconcile;
pub mod sequencer;
pub mod traits;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;
