//! Polled quadrature encoder
//!
//! Decodes two-channel quadrature signals in ×4 mode: every edge on either
//! channel is one tick. The channels are sampled on every `read()`, so the
//! caller must poll faster than the encoder can change state twice.
//!
//! State is the 2-bit value `A << 1 | B`. Channel A leading B counts up.
//! A sample where both channels changed at once cannot be decoded; it is
//! counted as a missed transition and leaves the count alone.

use embedded_hal::digital::InputPin;
use marionette_core::traits::{AxisEncoder, AxisError};

/// Count delta indexed by `previous_state << 2 | current_state`
const TRANSITIONS: [i8; 16] = [
    0, -1, 1, 0, //
    1, 0, 0, -1, //
    -1, 0, 0, 1, //
    0, 1, -1, 0,
];

/// Quadrature encoder on two input pins
pub struct QuadratureEncoder<A, B> {
    a: A,
    b: B,
    /// Last sampled `A << 1 | B`
    state: u8,
    /// Cumulative tick count
    count: i32,
    /// Samples where both channels changed
    missed: u32,
}

impl<A: InputPin, B: InputPin> QuadratureEncoder<A, B> {
    /// Create an encoder, taking the current pin levels as the start state
    pub fn new(a: A, b: B) -> Result<Self, AxisError> {
        let mut encoder = Self {
            a,
            b,
            state: 0,
            count: 0,
            missed: 0,
        };
        encoder.state = encoder.read_state()?;
        Ok(encoder)
    }

    /// Cumulative tick count
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Number of undecodable transitions seen
    pub fn missed(&self) -> u32 {
        self.missed
    }

    /// Sample both channels and update the count
    pub fn sample(&mut self) -> Result<(), AxisError> {
        let current = self.read_state()?;
        if current == self.state {
            return Ok(());
        }

        if current ^ self.state == 0b11 {
            self.missed = self.missed.saturating_add(1);
        } else {
            let delta = TRANSITIONS[((self.state << 2) | current) as usize];
            self.count = self.count.wrapping_add(delta as i32);
        }
        self.state = current;
        Ok(())
    }

    fn read_state(&mut self) -> Result<u8, AxisError> {
        let a = self.a.is_high().map_err(|_| AxisError::Input)?;
        let b = self.b.is_high().map_err(|_| AxisError::Input)?;
        Ok(((a as u8) << 1) | b as u8)
    }
}

impl<A: InputPin, B: InputPin> AxisEncoder for QuadratureEncoder<A, B> {
    fn read(&mut self) -> Result<i32, AxisError> {
        self.sample()?;
        Ok(self.count)
    }
}
