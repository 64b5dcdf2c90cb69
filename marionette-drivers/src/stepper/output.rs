//! Step outputs
//!
//! A step output turns "the driver moved to position N" into pin levels.
//! Two flavors are provided:
//!
//! - [`FourPhase`]: four coil pins driven directly in full-step wave order
//!   (28BYJ-48 on a ULN2003 board)
//! - [`StepDir`]: pulse/direction driver boards (A4988, DRV8825, TMC in
//!   standalone mode)

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use marionette_core::traits::AxisError;

/// Direction of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepDirection {
    /// Position increments
    Clockwise,
    /// Position decrements
    CounterClockwise,
}

/// Pin-level output for one stepper
pub trait StepOutput {
    /// Emit one step that brings the motor to `position`
    fn step(&mut self, position: i32, direction: StepDirection) -> Result<(), AxisError>;

    /// De-energise the motor
    fn release(&mut self) -> Result<(), AxisError>;
}

/// Coil masks for the full-step sequence, bit `i` drives pin `i`
const FULL_STEP_MASKS: [u8; 4] = [0b0101, 0b0110, 0b1010, 0b1001];

/// Four-wire full-step coil output
///
/// The pattern is a function of position only, so a position overwrite
/// simply selects a different pattern on the next step.
pub struct FourPhase<P> {
    pins: [P; 4],
}

impl<P: OutputPin> FourPhase<P> {
    /// Create a four-phase output
    ///
    /// Pins are given in driver order. A 28BYJ-48 on a ULN2003 board is
    /// wired IN1, IN3, IN2, IN4.
    pub fn new(pins: [P; 4]) -> Self {
        Self { pins }
    }

    /// Coil mask for a position
    pub fn mask_for(position: i32) -> u8 {
        FULL_STEP_MASKS[(position & 3) as usize]
    }

    /// Drive the pins to a coil mask
    fn write_mask(&mut self, mask: u8) -> Result<(), AxisError> {
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                pin.set_high().map_err(|_| AxisError::Output)?;
            } else {
                pin.set_low().map_err(|_| AxisError::Output)?;
            }
        }
        Ok(())
    }
}

impl<P: OutputPin> StepOutput for FourPhase<P> {
    fn step(&mut self, position: i32, _direction: StepDirection) -> Result<(), AxisError> {
        self.write_mask(Self::mask_for(position))
    }

    fn release(&mut self) -> Result<(), AxisError> {
        self.write_mask(0)
    }
}

/// Step/direction driver board output
pub struct StepDir<S, D, DL> {
    step: S,
    dir: D,
    delay: DL,
    /// Minimum step pulse width in µs
    pulse_width_us: u32,
    /// Direction pin is high for counter-clockwise steps
    invert_dir: bool,
}

impl<S: OutputPin, D: OutputPin, DL: DelayNs> StepDir<S, D, DL> {
    /// Create a step/direction output
    pub fn new(step: S, dir: D, delay: DL, pulse_width_us: u32) -> Self {
        Self {
            step,
            dir,
            delay,
            pulse_width_us,
            invert_dir: false,
        }
    }

    /// Flip the direction pin polarity
    pub fn with_inverted_direction(mut self, invert: bool) -> Self {
        self.invert_dir = invert;
        self
    }
}

impl<S: OutputPin, D: OutputPin, DL: DelayNs> StepOutput for StepDir<S, D, DL> {
    fn step(&mut self, _position: i32, direction: StepDirection) -> Result<(), AxisError> {
        let high = (direction == StepDirection::Clockwise) != self.invert_dir;
        if high {
            self.dir.set_high().map_err(|_| AxisError::Output)?;
        } else {
            self.dir.set_low().map_err(|_| AxisError::Output)?;
        }

        self.step.set_high().map_err(|_| AxisError::Output)?;
        self.delay.delay_us(self.pulse_width_us);
        self.step.set_low().map_err(|_| AxisError::Output)?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), AxisError> {
        // Board holds torque through its own enable pin
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock output pin that records its level and rising edges
    #[derive(Default)]
    pub(crate) struct MockPin {
        pub high: bool,
        pub rising_edges: usize,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            if !self.high {
                self.rising_edges += 1;
            }
            self.high = true;
            Ok(())
        }
    }

    /// Pin that always fails
    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }
    }

    /// Delay that only records what was asked of it
    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    fn levels(output: &FourPhase<MockPin>) -> u8 {
        output
            .pins
            .iter()
            .enumerate()
            .fold(0, |acc, (i, pin)| acc | ((pin.high as u8) << i))
    }

    #[test]
    fn test_four_phase_sequence() {
        let mut output = FourPhase::new(Default::default());

        for (position, expected) in [(0, 0b0101), (1, 0b0110), (2, 0b1010), (3, 0b1001), (4, 0b0101)] {
            output.step(position, StepDirection::Clockwise).unwrap();
            assert_eq!(levels(&output), expected, "position {}", position);
        }
    }

    #[test]
    fn test_four_phase_negative_positions_wrap() {
        assert_eq!(FourPhase::<MockPin>::mask_for(-1), 0b1001);
        assert_eq!(FourPhase::<MockPin>::mask_for(-4), 0b0101);
        assert_eq!(FourPhase::<MockPin>::mask_for(-3200), FourPhase::<MockPin>::mask_for(0));
    }

    #[test]
    fn test_four_phase_release() {
        let mut output = FourPhase::new(Default::default());
        output.step(1, StepDirection::Clockwise).unwrap();
        output.release().unwrap();
        assert_eq!(levels(&output), 0);
    }

    #[test]
    fn test_four_phase_pin_error() {
        let mut output = FourPhase::new([BrokenPin, BrokenPin, BrokenPin, BrokenPin]);
        assert_eq!(output.step(0, StepDirection::Clockwise), Err(AxisError::Output));
    }

    #[test]
    fn test_step_dir_pulse() {
        let mut output = StepDir::new(MockPin::default(), MockPin::default(), MockDelay::default(), 2);

        output.step(1, StepDirection::Clockwise).unwrap();
        assert!(output.dir.high);
        assert_eq!(output.step.rising_edges, 1);
        assert!(!output.step.high);
        assert_eq!(output.delay.total_ns, 2_000);

        output.step(0, StepDirection::CounterClockwise).unwrap();
        assert!(!output.dir.high);
        assert_eq!(output.step.rising_edges, 2);
    }

    #[test]
    fn test_step_dir_inverted() {
        let mut output = StepDir::new(MockPin::default(), MockPin::default(), MockDelay::default(), 1)
            .with_inverted_direction(true);

        output.step(1, StepDirection::Clockwise).unwrap();
        assert!(!output.dir.high);
    }
}
