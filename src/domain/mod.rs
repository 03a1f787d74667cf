//! Domain-level structures shared across the detection pipeline.
//!
//! This module groups the OCR collaborator interface and the region types
//! handed back to callers.

pub mod region;
pub mod text;

pub use region::{FilteredRegion, ScoredContour};
pub use text::{NoTextDetector, StaticTextDetector, TextDetection, TextDetector};
