//! The core module of the detection pipeline.
//!
//! This module contains the pieces every stage relies on:
//! - Configuration validation and the batch parallel policy
//! - Default parameter constants
//! - Error handling
//!
//! It also re-exports commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;

pub use crate::utils::{dynamic_to_rgb, load_image};
pub use config::{ConfigError, ConfigValidator, ParallelPolicy};
pub use constants::*;
pub use errors::{ProcessingStage, RegionError, RegionResult};
