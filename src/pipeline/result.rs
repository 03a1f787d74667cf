//! Results returned by the detection pipeline.

use crate::domain::FilteredRegion;
use crate::processors::geometry::ElementBox;
use crate::processors::mask::{EdgeMap, TextMask};
use std::fmt;

/// Counters describing one detection run.
///
/// Entries that were skipped rather than failing the run are reported here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionStats {
    /// Text detections returned by the OCR collaborator.
    pub text_detections: usize,
    /// Text detections painted into the text mask.
    pub text_kept: usize,
    /// Malformed text detections that were skipped.
    pub text_skipped: usize,
    /// Edge pixels before text exclusion.
    pub edge_pixels: usize,
    /// Edge pixels left after text exclusion.
    pub masked_edge_pixels: usize,
    /// Boxes or contours produced by region extraction.
    pub raw_regions: usize,
    /// Contours dropped for failing geometric validation.
    pub skipped_contours: usize,
    /// Regions in the final result.
    pub final_regions: usize,
    /// Wall-clock time of the run in milliseconds.
    pub elapsed_ms: f64,
}

impl DetectionStats {
    /// Fraction of edge pixels removed by the text mask, in `[0, 1]`.
    pub fn text_exclusion_ratio(&self) -> f64 {
        if self.edge_pixels == 0 {
            0.0
        } else {
            1.0 - self.masked_edge_pixels as f64 / self.edge_pixels as f64
        }
    }
}

impl fmt::Display for DetectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detection Statistics:")?;
        writeln!(
            f,
            "  Text detections: {} (kept {}, skipped {})",
            self.text_detections, self.text_kept, self.text_skipped
        )?;
        writeln!(
            f,
            "  Edge pixels: {} ({} after text exclusion, {:.1}% removed)",
            self.edge_pixels,
            self.masked_edge_pixels,
            self.text_exclusion_ratio() * 100.0
        )?;
        writeln!(
            f,
            "  Regions: {} raw, {} skipped, {} final",
            self.raw_regions, self.skipped_contours, self.final_regions
        )?;
        write!(f, "  Elapsed: {:.2}ms", self.elapsed_ms)
    }
}

/// Output of the connected-component box path.
#[derive(Debug, Clone)]
pub struct BoxDetection {
    /// Merged candidate boxes, inside the image bounds.
    pub boxes: Vec<ElementBox>,
    /// Edge map after text exclusion.
    pub edge_map: EdgeMap,
    pub text_mask: TextMask,
    pub stats: DetectionStats,
}

/// Output of the contour scoring path.
#[derive(Debug, Clone)]
pub struct ContourDetection {
    /// Surviving contours in descending score order.
    pub regions: Vec<FilteredRegion>,
    /// Edge map after text exclusion.
    pub edge_map: EdgeMap,
    pub text_mask: TextMask,
    pub stats: DetectionStats,
}

impl ContourDetection {
    /// Bounding boxes of the surviving contours, in score order.
    pub fn boxes(&self) -> Vec<ElementBox> {
        self.regions.iter().map(|r| r.bounding_box).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_ratio() {
        let stats = DetectionStats {
            edge_pixels: 200,
            masked_edge_pixels: 150,
            ..DetectionStats::default()
        };
        assert!((stats.text_exclusion_ratio() - 0.25).abs() < 1e-12);
        assert_eq!(DetectionStats::default().text_exclusion_ratio(), 0.0);
    }

    #[test]
    fn test_stats_display() {
        let stats = DetectionStats {
            text_detections: 3,
            text_kept: 2,
            text_skipped: 1,
            raw_regions: 10,
            final_regions: 4,
            ..DetectionStats::default()
        };
        let rendered = stats.to_string();
        assert!(rendered.contains("Text detections: 3 (kept 2, skipped 1)"));
        assert!(rendered.contains("10 raw"));
        assert!(rendered.contains("4 final"));
    }
}
