//! The region detection pipeline.
//!
//! This module ties the processing stages together behind
//! [`ElementDetector`], together with its configuration and result types.

mod config;
mod detector;
mod result;

pub use config::{BoxDetectionConfig, ContourDetectionConfig, DetectorConfig};
pub use detector::ElementDetector;
pub use result::{BoxDetection, ContourDetection, DetectionStats};
