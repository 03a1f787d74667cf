//! Contrast scoring and ranking of contours.
//!
//! A contour scores high when the colors inside it differ strongly from the
//! ring of pixels just outside it. Both regions are sampled from an HSV image
//! with text pixels excluded, so labels do not inflate the contrast of the
//! shapes they sit on.

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{DEFAULT_RATIO_THRESHOLD, DEFAULT_RING_MARGIN, DEFAULT_TOP_N};
use crate::domain::{FilteredRegion, ScoredContour};
use crate::processors::color::HsvImage;
use crate::processors::geometry::{Contour, Point, Polygon, clamp_pixel};
use crate::processors::mask::{BinaryMask, TextMask};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for scoring and filtering contours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Width of the sampling ring around each contour's bounding box.
    pub margin: u32,
    /// Number of best-scoring contours kept before the ratio test.
    pub top_n: usize,
    /// Minimum `area / perimeter` for a contour to be reported.
    pub ratio_threshold: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_RING_MARGIN,
            top_n: DEFAULT_TOP_N,
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
        }
    }
}

impl ConfigValidator for ScoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_non_negative_f32(self.ratio_threshold, "ratio_threshold")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelSum {
    sum: [f64; 3],
    count: usize,
}

impl ChannelSum {
    fn add(&mut self, pixel: [u8; 3]) {
        for (acc, value) in self.sum.iter_mut().zip(pixel) {
            *acc += f64::from(value);
        }
        self.count += 1;
    }

    fn mean(&self) -> Option<[f64; 3]> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(self.sum.map(|s| s / n))
    }
}

/// Sum of HSV distances between the interior of `contour` and the mean color
/// of its surrounding ring.
///
/// The interior is the filled contour, boundary included. The ring is the
/// contour's bounding box grown by `margin` (clamped to the image) minus the
/// interior. Pixels set in `text_mask` belong to neither. An empty interior
/// scores 0; an empty ring makes the interior mean the reference.
pub fn score_contour(
    hsv: &HsvImage,
    contour: &Contour,
    margin: u32,
    text_mask: &TextMask,
) -> f64 {
    let (width, height) = hsv.dimensions();
    let Some((x_min, y_min, x_max, y_max)) = contour.bounds() else {
        return 0.0;
    };
    if width == 0 || height == 0 || !contour.is_well_formed(1) {
        return 0.0;
    }

    let margin = f64::from(margin);
    let left = clamp_pixel(f64::from(x_min.floor()) - margin, width);
    let top = clamp_pixel(f64::from(y_min.floor()) - margin, height);
    let right = clamp_pixel(f64::from(x_max.floor()) + margin, width);
    let bottom = clamp_pixel(f64::from(y_max.floor()) + margin, height);
    if right < 0 || bottom < 0 || left >= i64::from(width) || top >= i64::from(height) {
        return 0.0;
    }
    let left = left.max(0) as u32;
    let top = top.max(0) as u32;
    let right = right.min(i64::from(width) - 1) as u32;
    let bottom = bottom.min(i64::from(height) - 1) as u32;
    if right < left || bottom < top {
        return 0.0;
    }

    // rasterize the interior in window coordinates
    let local = Polygon::new(
        contour
            .points
            .iter()
            .map(|p| Point::new(p.x - left as f32, p.y - top as f32))
            .collect(),
    );
    let mut interior = BinaryMask::new(right - left + 1, bottom - top + 1);
    interior.fill_polygon(&local);

    let mut inside = Vec::new();
    let mut ring = ChannelSum::default();
    for y in top..=bottom {
        for x in left..=right {
            if text_mask.get(x, y) {
                continue;
            }
            let pixel = hsv.get_pixel(x, y).0;
            if interior.get(x - left, y - top) {
                inside.push(pixel);
            } else {
                ring.add(pixel);
            }
        }
    }

    if inside.is_empty() {
        return 0.0;
    }

    let reference = match ring.mean() {
        Some(mean) => mean,
        None => {
            let mut sum = ChannelSum::default();
            inside.iter().for_each(|&p| sum.add(p));
            match sum.mean() {
                Some(mean) => mean,
                None => return 0.0,
            }
        }
    };

    inside
        .iter()
        .map(|pixel| {
            pixel
                .iter()
                .zip(reference.iter())
                .map(|(&v, &r)| {
                    let d = f64::from(v) - r;
                    d * d
                })
                .sum::<f64>()
                .sqrt()
        })
        .sum()
}

/// Scores every contour, skipping those that fail geometric validation.
///
/// Returns the scored contours in input order and the number skipped.
pub fn score_contours(
    hsv: &HsvImage,
    contours: Vec<Contour>,
    margin: u32,
    text_mask: &TextMask,
) -> (Vec<ScoredContour>, usize) {
    let mut skipped = 0;
    let scored = contours
        .into_iter()
        .filter(|contour| {
            let valid = contour.is_well_formed(1);
            if !valid {
                skipped += 1;
            }
            valid
        })
        .map(|contour| {
            let score = score_contour(hsv, &contour, margin, text_mask);
            ScoredContour::new(contour, score)
        })
        .collect();
    (scored, skipped)
}

/// Keeps the `top_n` best-scoring contours, then those with
/// `area / perimeter >= ratio_threshold`.
///
/// Ties keep their input order. A perimeter of 0 always fails the ratio test.
pub fn rank_and_filter(
    mut scored: Vec<ScoredContour>,
    top_n: usize,
    ratio_threshold: f32,
    image_width: u32,
    image_height: u32,
) -> Vec<FilteredRegion> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);

    let ranked = scored.len();
    let regions: Vec<FilteredRegion> = scored
        .into_iter()
        .filter_map(|candidate| {
            let area = candidate.contour.area();
            let perimeter = candidate.contour.perimeter();
            if perimeter <= 0.0 || area / perimeter < ratio_threshold {
                return None;
            }
            let bounding_box = candidate
                .contour
                .bounding_box(image_width, image_height)?;
            Some(FilteredRegion {
                contour: candidate.contour,
                score: candidate.score,
                area,
                perimeter,
                bounding_box,
            })
        })
        .collect();

    debug!(
        ranked,
        kept = regions.len(),
        top_n,
        ratio_threshold,
        "contours ranked and filtered"
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::color::rgb_to_hsv;
    use crate::processors::geometry::ElementBox;
    use image::{Rgb, RgbImage};

    const EPS: f64 = 1e-9;

    fn panel_hsv() -> HsvImage {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        for y in 10..=20 {
            for x in 10..=20 {
                img.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }
        rgb_to_hsv(&img)
    }

    #[test]
    fn test_uniform_region_scores_zero() {
        let hsv = rgb_to_hsv(&RgbImage::from_pixel(30, 30, Rgb([90, 140, 30])));
        let contour = Polygon::from_coords(5.0, 5.0, 15.0, 15.0);
        let score = score_contour(&hsv, &contour, 5, &BinaryMask::new(30, 30));
        assert!(score.abs() < EPS);
    }

    #[test]
    fn test_contrasting_panel_scores_interior_distance() {
        let hsv = panel_hsv();
        let contour = Polygon::from_coords(10.0, 10.0, 20.0, 20.0);
        let score = score_contour(&hsv, &contour, 5, &BinaryMask::new(40, 40));

        // blue [120, 255, 255] against white [0, 0, 255]
        let per_pixel = (120.0f64 * 120.0 + 255.0 * 255.0).sqrt();
        assert!((score - per_pixel * 121.0).abs() < 1e-6);
    }

    #[test]
    fn test_text_pixels_are_ignored() {
        let hsv = panel_hsv();
        let contour = Polygon::from_coords(10.0, 10.0, 20.0, 20.0);

        let mut covered = BinaryMask::new(40, 40);
        covered.fill_rect(&ElementBox::new(10, 10, 10, 10));
        assert_eq!(score_contour(&hsv, &contour, 5, &covered), 0.0);

        let mut half = BinaryMask::new(40, 40);
        half.fill_rect(&ElementBox::new(10, 10, 10, 4));
        let full = score_contour(&hsv, &contour, 5, &BinaryMask::new(40, 40));
        let partial = score_contour(&hsv, &contour, 5, &half);
        assert!(partial > 0.0 && partial < full);
    }

    #[test]
    fn test_empty_ring_falls_back_to_interior_mean() {
        let hsv = rgb_to_hsv(&RgbImage::from_pixel(12, 12, Rgb([10, 200, 60])));
        let contour = Polygon::from_coords(0.0, 0.0, 11.0, 11.0);
        let score = score_contour(&hsv, &contour, 5, &BinaryMask::new(12, 12));
        assert!(score.abs() < EPS);
    }

    #[test]
    fn test_degenerate_contours() {
        let hsv = panel_hsv();
        let mask = BinaryMask::new(40, 40);
        assert_eq!(score_contour(&hsv, &Polygon::default(), 5, &mask), 0.0);

        let broken = Polygon::new(vec![Point::new(f32::NAN, 3.0), Point::new(4.0, 4.0)]);
        let (scored, skipped) =
            score_contours(&hsv, vec![broken, Polygon::from_coords(10.0, 10.0, 20.0, 20.0)], 5, &mask);
        assert_eq!(scored.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_rank_keeps_top_n_then_filters_ratio() {
        let big = Polygon::from_coords(0.0, 0.0, 20.0, 20.0); // ratio 5
        let small = Polygon::from_coords(0.0, 0.0, 2.0, 2.0); // ratio 0.5
        let line = Polygon::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]);
        let scored = vec![
            ScoredContour::new(small.clone(), 50.0),
            ScoredContour::new(big.clone(), 10.0),
            ScoredContour::new(line, 99.0),
            ScoredContour::new(big.clone(), 1.0),
        ];

        let regions = rank_and_filter(scored.clone(), 3, 1.0, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].score, 10.0);
        assert_eq!(regions[0].bounding_box, ElementBox::new(0, 0, 20, 20));
        assert!((regions[0].compactness() - 5.0).abs() < 1e-5);

        let all = rank_and_filter(scored, 10, 0.0, 100, 100);
        // the zero-perimeter contour never passes
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_with_zero_top_n() {
        let scored = vec![ScoredContour::new(
            Polygon::from_coords(0.0, 0.0, 20.0, 20.0),
            4.0,
        )];
        assert!(rank_and_filter(scored, 0, 1.0, 50, 50).is_empty());
    }

    #[test]
    fn test_far_contour_scores_within_image() {
        let hsv = panel_hsv();
        let contour = Polygon::from_coords(-1e30, 10.0, 20.0, 20.0);
        let score = score_contour(&hsv, &contour, 5, &BinaryMask::new(40, 40));
        assert!(score.is_finite());
        assert!(score > 0.0);
    }
}
