//! Shutter Common Utilities
//!
//! Shared infrastructure for all Shutter crates:
//! - Error types and result aliases
//! - Camera value types (lens, flash, picture options, artifacts)
//! - Recording clock
//! - Tracing/logging initialization
//! - Configuration loading

pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use camera::*;
pub use clock::*;
pub use config::*;
pub use error::*;
