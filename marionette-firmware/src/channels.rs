//! Inter-task communication channels
//!
//! Defines the static signals used for communication between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use marionette_core::sequencer::Stage;

/// Stage changes reported by the puppet task (consumed by the heartbeat)
pub static STAGE: Signal<CriticalSectionRawMutex, Stage> = Signal::new();
