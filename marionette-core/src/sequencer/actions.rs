//! Sequencer output actions

use heapless::Vec;

/// Most actions a single tick can produce
pub const MAX_ACTIONS: usize = 4;

/// Work the controller must carry out, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Both axes are at rest at a stage boundary: reconcile positions
    Reconcile,
    /// A stage was entered (its move may still be waiting on a settle delay)
    EnterStage(u8),
    /// Issue the pose of this stage to the axes
    ApplyPose(u8),
    /// Choreography finished and will restart at this timestamp
    BeginCooldown { resume_at_ms: u64 },
    /// Choreography finished for good
    Halt,
}

/// Ordered actions from one sequencer tick
pub type Actions = Vec<Action, MAX_ACTIONS>;
