//! Holo-Control Common Utilities
//!
//! Shared infrastructure for all Holo-Control crates:
//! - Error types and result aliases
//! - Session clock and broadcast rate control
//! - Tracing/logging initialization
//! - Configuration loading and gesture-tuning profiles

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
