//! Text occlusion mask construction.
//!
//! OCR detections are turned into a [`TextMask`] whose set pixels are excluded
//! from edge-based region extraction and from contour scoring. Detections
//! below the confidence threshold are ignored, malformed ones are skipped and
//! counted, and a failing OCR collaborator yields an empty mask.

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::{ProcessingStage, RegionError};
use crate::core::constants::{DEFAULT_TEXT_CONFIDENCE, DEFAULT_TEXT_MARGIN};
use crate::domain::{TextDetection, TextDetector};
use crate::processors::geometry::{ElementBox, clamp_pixel};
use crate::processors::mask::{BinaryMask, TextMask};
use image::RgbImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a retained detection is painted into the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextMaskShape {
    /// Axis-aligned bounding rectangle of the polygon, expanded by the margin.
    #[default]
    BoundingRect,
    /// The polygon itself, grown by the margin with a square dilation.
    Polygon,
}

/// Configuration for [`TextMaskBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMaskConfig {
    /// Detections with a lower confidence are ignored.
    pub confidence_threshold: f32,
    /// Pixels added on every side of a retained detection.
    pub margin: u32,
    pub shape: TextMaskShape,
}

impl Default for TextMaskConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_TEXT_CONFIDENCE,
            margin: DEFAULT_TEXT_MARGIN,
            shape: TextMaskShape::BoundingRect,
        }
    }
}

impl TextMaskConfig {
    pub fn new(confidence_threshold: f32, margin: u32) -> Self {
        Self {
            confidence_threshold,
            margin,
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: TextMaskShape) -> Self {
        self.shape = shape;
        self
    }
}

impl ConfigValidator for TextMaskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        // thresholds above 1 are allowed and simply reject every detection
        self.validate_finite_f32(self.confidence_threshold, "confidence_threshold")?;
        if self.shape == TextMaskShape::Polygon && self.margin > u32::from(u8::MAX) {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "margin must be at most {} for polygon masks, got {}",
                    u8::MAX,
                    self.margin
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// A text mask together with the bookkeeping of how it was built.
#[derive(Debug, Clone)]
pub struct TextMaskOutcome {
    pub mask: TextMask,
    /// Detections returned by the collaborator.
    pub received: usize,
    /// Detections painted into the mask.
    pub kept: usize,
    /// Detections dropped for falling below the confidence threshold.
    pub below_threshold: usize,
    /// Malformed detections that were skipped.
    pub skipped: usize,
    /// Message of the collaborator failure, when the mask was built without it.
    pub detector_error: Option<String>,
}

/// Builds text masks from OCR detections.
#[derive(Debug, Clone, Default)]
pub struct TextMaskBuilder {
    config: TextMaskConfig,
}

impl TextMaskBuilder {
    pub fn new(config: TextMaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TextMaskConfig {
        &self.config
    }

    /// Queries `detector` for `image` and paints the retained detections.
    ///
    /// A detector error is logged and treated as "no text".
    pub fn build(&self, detector: &dyn TextDetector, image: &RgbImage) -> TextMaskOutcome {
        match detector.detect_text_regions(image) {
            Ok(detections) => {
                self.build_from_detections(&detections, image.width(), image.height())
            }
            Err(err) => {
                let err = RegionError::processing_error(
                    ProcessingStage::TextMasking,
                    "text detector returned an error",
                    err,
                );
                warn!(error = %err, "continuing with an empty text mask");
                let mut outcome = self.build_from_detections(&[], image.width(), image.height());
                outcome.detector_error = Some(err.to_string());
                outcome
            }
        }
    }

    /// Paints already available detections into a `width` x `height` mask.
    pub fn build_from_detections(
        &self,
        detections: &[TextDetection],
        width: u32,
        height: u32,
    ) -> TextMaskOutcome {
        let mut mask = BinaryMask::new(width, height);
        let mut kept = 0;
        let mut below_threshold = 0;
        let mut skipped = 0;

        for (index, detection) in detections.iter().enumerate() {
            if !detection.is_well_formed() {
                skipped += 1;
                warn!(
                    index,
                    points = detection.polygon.len(),
                    "skipping malformed text detection"
                );
                continue;
            }
            if detection.confidence < self.config.confidence_threshold {
                below_threshold += 1;
                continue;
            }

            match self.config.shape {
                TextMaskShape::BoundingRect => {
                    if let Some(rect) = expanded_bounds(detection, self.config.margin, width, height)
                    {
                        mask.fill_rect(&rect);
                    }
                }
                TextMaskShape::Polygon => mask.fill_polygon(&detection.polygon),
            }
            kept += 1;
        }

        if self.config.shape == TextMaskShape::Polygon && self.config.margin > 0 && kept > 0 {
            let radius = self.config.margin.min(u32::from(u8::MAX)) as u8;
            mask = BinaryMask::from(morphology::dilate(mask.as_gray(), Norm::LInf, radius));
        }

        debug!(
            received = detections.len(),
            kept, below_threshold, skipped, "text mask built"
        );

        TextMaskOutcome {
            mask,
            received: detections.len(),
            kept,
            below_threshold,
            skipped,
            detector_error: None,
        }
    }
}

/// Builds a text mask for `image` with bounding-rectangle painting.
pub fn build_text_mask(
    detector: &dyn TextDetector,
    image: &RgbImage,
    confidence_threshold: f32,
    margin: u32,
) -> TextMask {
    TextMaskBuilder::new(TextMaskConfig::new(confidence_threshold, margin))
        .build(detector, image)
        .mask
}

/// Bounding rectangle of the detection grown by `margin`, clamped to the image.
fn expanded_bounds(
    detection: &TextDetection,
    margin: u32,
    width: u32,
    height: u32,
) -> Option<ElementBox> {
    let (x_min, y_min, x_max, y_max) = detection.polygon.bounds()?;
    let margin = f64::from(margin);
    let left = clamp_pixel(f64::from(x_min.floor()) - margin, width);
    let top = clamp_pixel(f64::from(y_min.floor()) - margin, height);
    let right = clamp_pixel(f64::from(x_max.floor()) + margin, width);
    let bottom = clamp_pixel(f64::from(y_max.floor()) + margin, height);
    if right < 0 || bottom < 0 || left >= i64::from(width) || top >= i64::from(height) {
        return None;
    }
    Some(ElementBox::clamped(
        left,
        top,
        right - left,
        bottom - top,
        width,
        height,
    ))
}
