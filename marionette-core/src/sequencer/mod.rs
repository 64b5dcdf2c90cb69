//! Stage sequencer
//!
//! Walks the choreography one stage at a time. A stage completes when both
//! axes are at rest; the sequencer then asks for reconciliation, advances
//! and issues the next pose. The sequencer never touches hardware: it
//! returns [`Action`]s for the controller to carry out.

pub mod actions;
pub mod machine;

pub use actions::{Action, Actions, MAX_ACTIONS};
pub use machine::{Pending, Sequencer, SequencerState, Stage};
