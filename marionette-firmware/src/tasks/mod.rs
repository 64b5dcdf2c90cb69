//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod puppet;

pub use puppet::{puppet_task, PuppetController};
