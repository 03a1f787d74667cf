//! Text detections and the OCR collaborator interface.
//!
//! The detection pipeline never runs OCR itself. It asks a caller-owned
//! [`TextDetector`] for `(polygon, confidence)` pairs and only uses them to
//! mask out text pixels. Adapters for concrete OCR engines normalize their
//! output into [`TextDetection`] values before handing them over.

use crate::core::RegionResult;
use crate::processors::geometry::{Point, Polygon};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// A single text region reported by OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetection {
    /// Outline of the text, in image pixel coordinates.
    pub polygon: Polygon,
    /// Detection confidence, nominally in `[0, 1]`.
    pub confidence: f32,
}

impl TextDetection {
    pub fn new(polygon: Polygon, confidence: f32) -> Self {
        Self {
            polygon,
            confidence,
        }
    }

    /// Returns true when the polygon has at least three finite vertices and the
    /// confidence is a finite number.
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite() && self.polygon.is_well_formed(3)
    }
}

/// Source of text detections for an image.
///
/// Implementations must be shareable across threads so a single detector can
/// serve batch runs. Closures with the matching signature implement the trait
/// directly:
///
/// ```
/// use oar_region::core::RegionResult;
/// use oar_region::domain::{TextDetection, TextDetector};
/// use oar_region::processors::Polygon;
///
/// let detector = |_: &image::RgbImage| -> RegionResult<Vec<TextDetection>> {
///     Ok(vec![TextDetection::new(Polygon::from_coords(2.0, 2.0, 20.0, 8.0), 0.93)])
/// };
/// let image = image::RgbImage::new(32, 32);
/// assert_eq!(detector.detect_text_regions(&image).unwrap().len(), 1);
/// ```
pub trait TextDetector: Send + Sync {
    /// Returns zero or more text detections for `image`.
    fn detect_text_regions(&self, image: &RgbImage) -> RegionResult<Vec<TextDetection>>;
}

impl<F> TextDetector for F
where
    F: Fn(&RgbImage) -> RegionResult<Vec<TextDetection>> + Send + Sync,
{
    fn detect_text_regions(&self, image: &RgbImage) -> RegionResult<Vec<TextDetection>> {
        self(image)
    }
}

/// A detector that never finds text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextDetector;

impl TextDetector for NoTextDetector {
    fn detect_text_regions(&self, _image: &RgbImage) -> RegionResult<Vec<TextDetection>> {
        Ok(Vec::new())
    }
}

/// On-disk form of a detection: `{"polygon": [[x, y], ...], "confidence": 0.9}`.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    polygon: Vec<[f32; 2]>,
    confidence: f32,
}

impl From<DetectionRecord> for TextDetection {
    fn from(record: DetectionRecord) -> Self {
        let points = record
            .polygon
            .into_iter()
            .map(|[x, y]| Point::new(x, y))
            .collect();
        TextDetection::new(Polygon::new(points), record.confidence)
    }
}

/// Replays a fixed set of detections, typically exported by an external OCR run.
///
/// Entries that do not match the record layout are skipped when loading; the
/// number skipped is available through [`StaticTextDetector::skipped`].
#[derive(Debug, Clone, Default)]
pub struct StaticTextDetector {
    detections: Vec<TextDetection>,
    skipped: usize,
}

impl StaticTextDetector {
    pub fn new(detections: Vec<TextDetection>) -> Self {
        Self {
            detections,
            skipped: 0,
        }
    }

    /// Parses a JSON array of detection records.
    ///
    /// Fails only when the document is not a JSON array.
    pub fn from_json_str(json: &str) -> RegionResult<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let total = entries.len();

        let mut detections = Vec::with_capacity(total);
        let mut skipped = 0;
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<DetectionRecord>(entry) {
                Ok(record) => detections.push(record.into()),
                Err(err) => {
                    skipped += 1;
                    warn!(index, error = %err, "skipping unrecognized text detection record");
                }
            }
        }

        debug!(loaded = detections.len(), skipped, "loaded text detections");
        Ok(Self {
            detections,
            skipped,
        })
    }

    /// Reads and parses a JSON detection file.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Io`](crate::core::RegionError::Io) if the file cannot be read.
    pub fn from_json_file(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).inspect_err(|e| {
            debug!(path = %path.display(), error = %e, "failed to read text detections");
        })?;
        Self::from_json_str(&content)
    }

    pub fn detections(&self) -> &[TextDetection] {
        &self.detections
    }

    /// Number of records dropped while loading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl TextDetector for StaticTextDetector {
    fn detect_text_regions(&self, _image: &RgbImage) -> RegionResult<Vec<TextDetection>> {
        Ok(self.detections.clone())
    }
}
