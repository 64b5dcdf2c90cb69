//! Controller events
//!
//! Everything worth logging that happens during a tick. The firmware turns
//! these into console diagnostics; tests assert on them directly.

use heapless::{String, Vec};

use crate::config::MAX_LABEL_LEN;
use crate::reconcile::{Correction, PositionSnapshot};

/// Most events a single tick can produce
pub const MAX_EVENTS: usize = 8;

/// Something the controller did
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PuppetEvent {
    /// A stage was entered
    StageEntered {
        stage: u8,
        label: String<MAX_LABEL_LEN>,
    },
    /// The stage's pose was issued to the axes
    PoseApplied(u8),
    /// Positions before and after a closed-loop reconciliation
    Reconciled {
        before: PositionSnapshot,
        after: PositionSnapshot,
    },
    /// A correction exceeded the configured bound and was not applied
    CorrectionRejected(Correction),
    /// Choreography finished; restarting after the cooldown
    CooldownStarted { resume_at_ms: u64 },
    /// Choreography finished; no further motion
    Halted,
}

/// Ordered events from one tick
pub type Events = Vec<PuppetEvent, MAX_EVENTS>;
