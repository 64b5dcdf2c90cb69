//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in marionette-core over `embedded-hal` 1.0 pins:
//!
//! - Acceleration-limited stepper driver (`AccelStepper`)
//! - Step outputs (four-phase unipolar coils, step/direction boards)
//! - Polled quadrature encoder

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod encoder;
pub mod stepper;
