//! The element detector: one call from screenshot to candidate regions.
//!
//! Two paths share the same front half (text mask, edge map, text exclusion):
//!
//! * [`ElementDetector::detect_boxes`] labels connected edge components,
//!   filters them by area and merges overlapping boxes. Coarse but cheap.
//! * [`ElementDetector::detect_contours`] traces external contours, scores
//!   each by interior/ring color contrast and keeps the best compact ones.
//!
//! A detector holds only immutable configuration and a shared OCR
//! collaborator, so one instance can serve many threads.

use crate::core::config::{ConfigValidator, ParallelPolicy};
use crate::core::{ProcessingStage, RegionError, RegionResult};
use crate::domain::{NoTextDetector, TextDetector};
use crate::pipeline::config::DetectorConfig;
use crate::pipeline::result::{BoxDetection, ContourDetection, DetectionStats};
use crate::processors::color::rgb_to_hsv;
use crate::processors::edges::EdgeExtractor;
use crate::processors::geometry::ElementBox;
use crate::processors::layout::{
    AlignmentLine, alignment_lines, merge_paragraphs, merge_text_lines, organization_score,
};
use crate::processors::mask::EdgeMap;
use crate::processors::merge::merge_overlapping_boxes;
use crate::processors::regions::{exclude_text, extract_component_boxes, extract_contours};
use crate::processors::scoring::{rank_and_filter, score_contours};
use crate::processors::text_mask::{TextMaskBuilder, TextMaskOutcome};
use crate::utils::load_image;
use image::RgbImage;
use rayon::prelude::*;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Detects candidate UI elements in screenshots.
///
/// # Example
///
/// ```rust
/// use oar_region::pipeline::{DetectorConfig, ElementDetector};
///
/// let detector = ElementDetector::new(DetectorConfig::default())?;
/// let blank = image::RgbImage::from_pixel(64, 48, image::Rgb([240, 240, 240]));
/// let result = detector.detect_boxes(&blank)?;
/// assert!(result.boxes.is_empty());
/// # Ok::<(), oar_region::core::RegionError>(())
/// ```
#[derive(Clone)]
pub struct ElementDetector {
    config: DetectorConfig,
    text_masks: TextMaskBuilder,
    box_edges: EdgeExtractor,
    contour_edges: EdgeExtractor,
    text_detector: Arc<dyn TextDetector>,
}

impl fmt::Debug for ElementDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDetector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Text mask and edge maps shared by both detection paths.
struct Prepared {
    text: TextMaskOutcome,
    edge_pixels: usize,
    masked_edges: EdgeMap,
}

impl ElementDetector {
    /// Creates a detector without an OCR collaborator; nothing is masked as text.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ConfigError`] if the configuration is invalid.
    pub fn new(config: DetectorConfig) -> RegionResult<Self> {
        config.validate()?;
        Ok(Self {
            text_masks: TextMaskBuilder::new(config.text_mask.clone()),
            box_edges: EdgeExtractor::new(config.boxes.edge.clone())?,
            contour_edges: EdgeExtractor::new(config.contours.edge.clone())?,
            text_detector: Arc::new(NoTextDetector),
            config,
        })
    }

    /// Uses `detector` to locate text in every analysed image.
    pub fn with_text_detector(mut self, detector: impl TextDetector + 'static) -> Self {
        self.text_detector = Arc::new(detector);
        self
    }

    /// Shares an already wrapped OCR collaborator.
    pub fn with_shared_text_detector(mut self, detector: Arc<dyn TextDetector>) -> Self {
        self.text_detector = detector;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn check_image(image: &RgbImage) -> RegionResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RegionError::invalid_input(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(())
    }

    fn prepare(&self, image: &RgbImage, edges: &EdgeExtractor, mask_text: bool) -> Prepared {
        let text = self.text_masks.build(self.text_detector.as_ref(), image);
        let edge_map = edges.extract(image);
        let edge_pixels = edge_map.count();
        let masked_edges = if mask_text {
            exclude_text(&edge_map, &text.mask)
        } else {
            edge_map
        };
        debug!(
            edge_pixels,
            masked_edge_pixels = masked_edges.count(),
            text_kept = text.kept,
            "edge map prepared"
        );
        Prepared {
            text,
            edge_pixels,
            masked_edges,
        }
    }

    fn base_stats(prepared: &Prepared) -> DetectionStats {
        DetectionStats {
            text_detections: prepared.text.received,
            text_kept: prepared.text.kept,
            text_skipped: prepared.text.skipped,
            edge_pixels: prepared.edge_pixels,
            masked_edge_pixels: prepared.masked_edges.count(),
            ..DetectionStats::default()
        }
    }

    /// Runs the connected-component box path on `image`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidInput`] for an image without pixels.
    pub fn detect_boxes(&self, image: &RgbImage) -> RegionResult<BoxDetection> {
        Self::check_image(image)?;
        let start = Instant::now();
        let settings = &self.config.boxes;

        let prepared = self.prepare(image, &self.box_edges, settings.exclude_text);
        let raw = extract_component_boxes(
            &prepared.masked_edges,
            settings.min_area,
            settings.max_area,
        );

        let mut boxes = merge_overlapping_boxes(&raw, settings.overlap_threshold);
        if let Some(line_merge) = &settings.line_merge {
            boxes = merge_text_lines(&boxes, line_merge);
        }
        if let Some(paragraph_merge) = &settings.paragraph_merge {
            boxes = merge_paragraphs(&boxes, paragraph_merge);
        }

        let stats = DetectionStats {
            raw_regions: raw.len(),
            final_regions: boxes.len(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            ..Self::base_stats(&prepared)
        };
        info!(
            raw = stats.raw_regions,
            boxes = stats.final_regions,
            elapsed_ms = stats.elapsed_ms,
            "box detection finished"
        );

        Ok(BoxDetection {
            boxes,
            edge_map: prepared.masked_edges,
            text_mask: prepared.text.mask,
            stats,
        })
    }

    /// Runs the contour scoring path on `image`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidInput`] for an image without pixels.
    pub fn detect_contours(&self, image: &RgbImage) -> RegionResult<ContourDetection> {
        Self::check_image(image)?;
        let start = Instant::now();
        let scoring = &self.config.contours.scoring;

        let prepared = self.prepare(image, &self.contour_edges, true);
        let contours = extract_contours(&prepared.masked_edges);
        let raw_regions = contours.len();

        let hsv = rgb_to_hsv(image);
        let (scored, skipped) =
            score_contours(&hsv, contours, scoring.margin, &prepared.text.mask);
        if skipped > 0 {
            warn!(skipped, "skipped contours that failed geometric validation");
        }
        let regions = rank_and_filter(
            scored,
            scoring.top_n,
            scoring.ratio_threshold,
            image.width(),
            image.height(),
        );

        let stats = DetectionStats {
            raw_regions,
            skipped_contours: skipped,
            final_regions: regions.len(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            ..Self::base_stats(&prepared)
        };
        info!(
            contours = stats.raw_regions,
            regions = stats.final_regions,
            elapsed_ms = stats.elapsed_ms,
            "contour detection finished"
        );

        Ok(ContourDetection {
            regions,
            edge_map: prepared.masked_edges,
            text_mask: prepared.text.mask,
            stats,
        })
    }

    /// Alignment guides shared by at least two of `boxes`, using the
    /// configured tolerances.
    pub fn alignment_lines(&self, boxes: &[ElementBox]) -> Vec<AlignmentLine> {
        alignment_lines(boxes, &self.config.alignment)
    }

    /// Layout regularity of `boxes` in `[0, 100]`.
    pub fn organization_score(&self, boxes: &[ElementBox]) -> f32 {
        organization_score(boxes, &self.config.alignment)
    }

    /// Loads `path` and runs the box path. A missing or undecodable file fails
    /// before any stage runs.
    pub fn detect_boxes_from_path(&self, path: &Path) -> RegionResult<BoxDetection> {
        let image = load_image(path)?;
        self.detect_boxes(&image)
    }

    /// Loads `path` and runs the contour path.
    pub fn detect_contours_from_path(&self, path: &Path) -> RegionResult<ContourDetection> {
        let image = load_image(path)?;
        self.detect_contours(&image)
    }

    /// Runs the box path on every image; results keep the input order.
    pub fn detect_boxes_batch(&self, images: &[RgbImage]) -> Vec<RegionResult<BoxDetection>> {
        self.run_batch(images, |image| self.detect_boxes(image))
    }

    /// Runs the contour path on every image; results keep the input order.
    pub fn detect_contours_batch(
        &self,
        images: &[RgbImage],
    ) -> Vec<RegionResult<ContourDetection>> {
        self.run_batch(images, |image| self.detect_contours(image))
    }

    fn run_batch<T, F>(&self, images: &[RgbImage], detect: F) -> Vec<RegionResult<T>>
    where
        T: Send,
        F: Fn(&RgbImage) -> RegionResult<T> + Sync + Send,
    {
        let policy: &ParallelPolicy = &self.config.parallel;
        if !policy.should_parallelize(images.len()) {
            debug!(images = images.len(), "running batch sequentially");
            return images.iter().map(&detect).collect();
        }

        let run = || images.par_iter().map(&detect).collect::<Vec<_>>();
        match policy.max_threads {
            Some(threads) => {
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => {
                        debug!(images = images.len(), threads, "running batch on dedicated pool");
                        pool.install(run)
                    }
                    Err(err) => {
                        let err = RegionError::processing_error(
                            ProcessingStage::BatchProcessing,
                            "failed to build thread pool",
                            err,
                        );
                        warn!(error = %err, "falling back to the global thread pool");
                        run()
                    }
                }
            }
            None => {
                debug!(images = images.len(), "running batch on global pool");
                run()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StaticTextDetector, TextDetection};
    use crate::pipeline::config::{BoxDetectionConfig, ContourDetectionConfig};
    use crate::processors::edges::EdgeMethod;
    use crate::processors::geometry::{ElementBox, Polygon};
    use crate::processors::scoring::ScoringConfig;
    use image::Rgb;

    const BACKGROUND: Rgb<u8> = Rgb([245, 245, 245]);

    fn fill(img: &mut RgbImage, rect: ElementBox, color: Rgb<u8>) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                img.put_pixel(x, y, color);
            }
        }
    }

    /// Two solid panels on a light background.
    fn two_panels() -> RgbImage {
        let mut img = RgbImage::from_pixel(160, 120, BACKGROUND);
        fill(&mut img, ElementBox::new(10, 10, 50, 40), Rgb([30, 90, 200]));
        fill(&mut img, ElementBox::new(90, 60, 50, 40), Rgb([200, 40, 40]));
        img
    }

    fn difference_contours() -> ContourDetectionConfig {
        ContourDetectionConfig {
            edge: EdgeMethod::difference_map(),
            scoring: ScoringConfig::default(),
        }
    }

    #[test]
    fn test_blank_image_yields_nothing() {
        let detector = ElementDetector::new(DetectorConfig::default()).unwrap();
        let blank = RgbImage::from_pixel(80, 60, BACKGROUND);

        let boxes = detector.detect_boxes(&blank).unwrap();
        assert!(boxes.boxes.is_empty());
        assert!(boxes.edge_map.is_empty());
        assert_eq!(boxes.stats.final_regions, 0);

        let contours = detector.detect_contours(&blank).unwrap();
        assert!(contours.regions.is_empty());
        assert_eq!(contours.stats.raw_regions, 0);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let detector = ElementDetector::new(DetectorConfig::default()).unwrap();
        let err = detector.detect_boxes(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, RegionError::InvalidInput { .. }));
        assert!(detector.detect_contours(&RgbImage::new(0, 0)).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DetectorConfig::default().with_boxes(BoxDetectionConfig {
            edge: EdgeMethod::perceptual(2.0),
            ..BoxDetectionConfig::default()
        });
        assert!(matches!(
            ElementDetector::new(config).unwrap_err(),
            RegionError::ConfigError { .. }
        ));
    }

    #[test]
    fn test_unreadable_image_fails_fast() {
        let detector = ElementDetector::new(DetectorConfig::default()).unwrap();
        let err = detector
            .detect_boxes_from_path(Path::new("/nonexistent/screen.png"))
            .unwrap_err();
        assert!(matches!(err, RegionError::ImageLoad(_)));
    }

    #[test]
    fn test_box_path_finds_both_panels() {
        let detector = ElementDetector::new(DetectorConfig::default()).unwrap();
        let result = detector.detect_boxes(&two_panels()).unwrap();

        assert_eq!(result.boxes.len(), 2);
        for b in &result.boxes {
            assert!(b.fits_within(160, 120));
        }
        assert!(result.boxes.iter().any(|b| b.x <= 10 && b.right() >= 59));
        assert!(result.boxes.iter().any(|b| b.x <= 90 && b.right() >= 139));
        assert_eq!(result.stats.raw_regions, 2);
    }

    #[test]
    fn test_text_mask_suppresses_panel_edges() {
        let text = StaticTextDetector::new(vec![TextDetection::new(
            Polygon::from_coords(8.0, 8.0, 62.0, 52.0),
            0.97,
        )]);
        let detector = ElementDetector::new(DetectorConfig::default())
            .unwrap()
            .with_text_detector(text);
        let result = detector.detect_boxes(&two_panels()).unwrap();

        assert_eq!(result.stats.text_kept, 1);
        assert!(result.stats.masked_edge_pixels < result.stats.edge_pixels);
        assert_eq!(result.boxes.len(), 1);
        assert!(result.boxes[0].x >= 80);
        assert!(result.text_mask.get(30, 30));
    }

    #[test]
    fn test_failing_ocr_does_not_fail_detection() {
        let failing = |_: &RgbImage| -> RegionResult<Vec<TextDetection>> {
            Err(RegionError::invalid_input("ocr unavailable"))
        };
        let detector = ElementDetector::new(DetectorConfig::default())
            .unwrap()
            .with_text_detector(failing);
        let result = detector.detect_boxes(&two_panels()).unwrap();
        assert!(result.text_mask.is_empty());
        assert_eq!(result.boxes.len(), 2);
    }

    #[test]
    fn test_contour_path_ranks_panels() {
        let config = DetectorConfig::default().with_contours(difference_contours());
        let detector = ElementDetector::new(config).unwrap();
        let result = detector.detect_contours(&two_panels()).unwrap();

        assert!(!result.regions.is_empty());
        assert!(result.regions.len() <= ScoringConfig::default().top_n);
        assert!(result.regions.windows(2).all(|w| w[0].score >= w[1].score));
        for region in &result.regions {
            assert!(region.perimeter > 0.0);
            assert!(region.area / region.perimeter >= 1.0);
            assert!(region.bounding_box.fits_within(160, 120));
        }
        assert_eq!(result.boxes().len(), result.regions.len());
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let policy = ParallelPolicy::new()
            .with_image_threshold(0)
            .with_max_threads(Some(2));
        let config = DetectorConfig::default().with_parallel_policy(policy);
        let detector = ElementDetector::new(config).unwrap();
        let images = vec![
            two_panels(),
            RgbImage::from_pixel(40, 40, BACKGROUND),
            RgbImage::new(0, 0),
        ];

        let batch = detector.detect_boxes_batch(&images);
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch[0].as_ref().unwrap().boxes,
            detector.detect_boxes(&images[0]).unwrap().boxes
        );
        assert!(batch[1].as_ref().unwrap().boxes.is_empty());
        assert!(batch[2].is_err());

        let contours = detector.detect_contours_batch(&images[..2]);
        assert!(contours.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_alignment_uses_configured_tolerances() {
        let detector = ElementDetector::new(DetectorConfig::default()).unwrap();
        let toolbar = [
            ElementBox::new(10, 10, 40, 20),
            ElementBox::new(70, 10, 40, 20),
            ElementBox::new(130, 12, 40, 20),
        ];
        let lines = detector.alignment_lines(&toolbar);
        assert!(lines.iter().all(|line| line.kind.is_horizontal()));
        assert!(lines.iter().any(|line| line.members == 3));
        // Only the y axis is shared: 0.5^0.3 * 100.
        let score = detector.organization_score(&toolbar);
        assert!((score - 81.225).abs() < 0.01);
        assert_eq!(detector.organization_score(&[]), 0.0);
    }
}
