//! Axis identifiers and per-axis storage
//!
//! Every per-joint resource (driver, encoder, cached measurements, pose
//! targets) is kept in an [`AxisPair`] indexed by [`Axis`], so axis-specific
//! behavior is a lookup rather than a comparison of handles.

use core::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Left joint
    Left,
    /// Right joint
    Right,
}

impl Axis {
    /// Both axes, in reporting order
    pub const ALL: [Axis; 2] = [Axis::Left, Axis::Right];

    /// Display name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Axis::Left => "Left",
            Axis::Right => "Right",
        }
    }
}

/// One value per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisPair<T> {
    pub left: T,
    pub right: T,
}

impl<T> AxisPair<T> {
    /// Create a pair from explicit left/right values
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Map both values through `f`
    pub fn map<U>(self, mut f: impl FnMut(Axis, T) -> U) -> AxisPair<U> {
        AxisPair {
            left: f(Axis::Left, self.left),
            right: f(Axis::Right, self.right),
        }
    }

    /// Borrow both values
    pub fn as_ref(&self) -> AxisPair<&T> {
        AxisPair {
            left: &self.left,
            right: &self.right,
        }
    }

    /// Check that `f` holds for both axes
    pub fn all(&self, mut f: impl FnMut(&T) -> bool) -> bool {
        f(&self.left) && f(&self.right)
    }
}

impl<T: Copy> AxisPair<T> {
    /// Same value for both axes
    pub const fn splat(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }
}

impl<T> Index<Axis> for AxisPair<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::Left => &self.left,
            Axis::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Axis> for AxisPair<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Left => &mut self.left,
            Axis::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_by_axis() {
        let mut pair = AxisPair::new(1, 2);
        assert_eq!(pair[Axis::Left], 1);
        assert_eq!(pair[Axis::Right], 2);

        pair[Axis::Right] = 5;
        assert_eq!(pair.right, 5);
    }

    #[test]
    fn test_map_passes_axis() {
        let pair = AxisPair::splat(10).map(|axis, v| match axis {
            Axis::Left => v + 1,
            Axis::Right => v - 1,
        });
        assert_eq!(pair, AxisPair::new(11, 9));
    }

    #[test]
    fn test_all() {
        assert!(AxisPair::new(0, 0).all(|v| *v == 0));
        assert!(!AxisPair::new(0, 3).all(|v| *v == 0));
    }

    #[test]
    fn test_axis_order_and_names() {
        assert_eq!(Axis::ALL, [Axis::Left, Axis::Right]);
        assert_eq!(Axis::Left.name(), "Left");
        assert_eq!(Axis::Right.name(), "Right");
        assert_ne!(Axis::Left, Axis::Right);
    }
}
