//! Configuration for the detection pipeline.
//!
//! All sections deserialize with defaults, so a JSON document only needs to
//! name the values it changes:
//!
//! ```json
//! {
//!   "text_mask": { "confidence_threshold": 0.9 },
//!   "boxes": { "min_area": 400, "edge": { "type": "Perceptual", "edge_threshold": 0.15 } },
//!   "contours": { "scoring": { "top_n": 20 } }
//! }
//! ```

use crate::core::config::{ConfigError, ConfigValidator, ParallelPolicy};
use crate::core::constants::{
    DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW, DEFAULT_EDGE_THRESHOLD, DEFAULT_MIN_AREA,
    DEFAULT_OVERLAP_THRESHOLD,
};
use crate::core::{RegionError, RegionResult};
use crate::processors::edges::EdgeMethod;
use crate::processors::layout::{AlignmentConfig, LineMergeConfig, ParagraphMergeConfig};
use crate::processors::scoring::ScoringConfig;
use crate::processors::text_mask::TextMaskConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the coarse connected-component box path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDetectionConfig {
    pub edge: EdgeMethod,
    /// Smallest `width * height` a component box may have.
    pub min_area: u64,
    /// Largest `width * height` a component box may have; None is unbounded.
    pub max_area: Option<u64>,
    /// IoU a pair of boxes must exceed to be merged.
    pub overlap_threshold: f32,
    /// Zero edge pixels under the text mask before labelling.
    pub exclude_text: bool,
    /// Join fragments of one text line after overlap merging.
    pub line_merge: Option<LineMergeConfig>,
    /// Stack lines into paragraphs after line merging.
    pub paragraph_merge: Option<ParagraphMergeConfig>,
}

impl Default for BoxDetectionConfig {
    fn default() -> Self {
        Self {
            edge: EdgeMethod::perceptual(DEFAULT_EDGE_THRESHOLD),
            min_area: DEFAULT_MIN_AREA,
            max_area: None,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            exclude_text: true,
            line_merge: None,
            paragraph_merge: None,
        }
    }
}

impl ConfigValidator for BoxDetectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.edge.validate()?;
        if let Some(max_area) = self.max_area
            && max_area < self.min_area
        {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "max_area ({}) must not be smaller than min_area ({})",
                    max_area, self.min_area
                ),
            });
        }
        self.validate_finite_f32(self.overlap_threshold, "overlap_threshold")?;
        if let Some(line_merge) = &self.line_merge {
            line_merge.validate()?;
        }
        if let Some(paragraph_merge) = &self.paragraph_merge {
            paragraph_merge.validate()?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Settings for the fine contour-scoring path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourDetectionConfig {
    pub edge: EdgeMethod,
    pub scoring: ScoringConfig,
}

impl Default for ContourDetectionConfig {
    fn default() -> Self {
        Self {
            edge: EdgeMethod::gradient(DEFAULT_CANNY_LOW, DEFAULT_CANNY_HIGH),
            scoring: ScoringConfig::default(),
        }
    }
}

impl ConfigValidator for ContourDetectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.edge.validate()?;
        self.scoring.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Complete configuration of an [`ElementDetector`](crate::pipeline::ElementDetector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorConfig {
    pub text_mask: TextMaskConfig,
    pub boxes: BoxDetectionConfig,
    pub contours: ContourDetectionConfig,
    /// Tolerances used for alignment lines and the organization score.
    pub alignment: AlignmentConfig,
    pub parallel: ParallelPolicy,
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_mask(mut self, text_mask: TextMaskConfig) -> Self {
        self.text_mask = text_mask;
        self
    }

    pub fn with_boxes(mut self, boxes: BoxDetectionConfig) -> Self {
        self.boxes = boxes;
        self
    }

    pub fn with_contours(mut self, contours: ContourDetectionConfig) -> Self {
        self.contours = contours;
        self
    }

    pub fn with_parallel_policy(mut self, parallel: ParallelPolicy) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> RegionResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use oar_region::pipeline::DetectorConfig;
    /// use std::path::Path;
    ///
    /// let config = DetectorConfig::from_json_file(Path::new("detector.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_json_file(path: &Path) -> RegionResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegionError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> RegionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ConfigValidator for DetectorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.text_mask.validate()?;
        self.boxes.validate()?;
        self.contours.validate()?;
        self.parallel.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
