//! Configuration types
//!
//! Board-agnostic puppet settings and the stage → pose choreography table,
//! plus the no_std parser for puppet.toml.

pub mod choreography;
pub mod toml;
pub mod types;

pub use choreography::*;
pub use toml::{parse_config, ParseError, ParsedConfig};
pub use types::*;
