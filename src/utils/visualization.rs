//! Visualization utilities for detection results.
//!
//! Renders candidate boxes, scored contours, alignment guides and the text
//! mask on top of the source screenshot.
//!
//! # Examples
//!
//! ```rust,no_run
//! use oar_region::prelude::*;
//! use oar_region::utils::visualization::{VisualizationConfig, visualize_boxes};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = load_image(Path::new("screenshot.png"))?;
//! let detector = ElementDetector::new(DetectorConfig::default())?;
//! let result = detector.detect_boxes(&image)?;
//! let guides = detector.alignment_lines(&result.boxes);
//! visualize_boxes(&image, &result, &guides, &VisualizationConfig::default(), Path::new("boxes.png"))?;
//! # Ok(())
//! # }
//! ```

use crate::core::{RegionError, RegionResult};
use crate::pipeline::{BoxDetection, ContourDetection};
use crate::processors::geometry::{ElementBox, Polygon};
use crate::processors::layout::{AlignmentKind, AlignmentLine};
use crate::processors::mask::BinaryMask;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

const TEXT_MASK_COLOR: Rgb<u8> = Rgb([255, 64, 64]);

const VERTICAL_GUIDE_COLOR: Rgb<u8> = Rgb([0, 160, 255]);

const HORIZONTAL_GUIDE_COLOR: Rgb<u8> = Rgb([255, 160, 0]);

/// Styling for rendered detections.
#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    /// Thickness of box outlines in pixels. Defaults to 2.
    pub bbox_thickness: i32,
    pub box_color: Rgb<u8>,
    pub contour_color: Rgb<u8>,
    /// Tint the text mask onto the output.
    pub show_text_mask: bool,
    /// Blend weight of the text mask tint, in `[0, 1]`.
    pub mask_alpha: f32,
    /// Draw alignment guides for the detected boxes.
    pub show_alignment: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            bbox_thickness: 2,
            box_color: BOX_COLOR,
            contour_color: CONTOUR_COLOR,
            show_text_mask: true,
            mask_alpha: 0.35,
            show_alignment: false,
        }
    }
}

/// Draws hollow rectangles for each box, thickened outward.
///
/// Rings that would leave the image are skipped.
pub fn draw_boxes(img: &mut RgbImage, boxes: &[ElementBox], color: Rgb<u8>, thickness: i32) {
    let (img_width, img_height) = (img.width() as i32, img.height() as i32);

    for element in boxes {
        let Some(rect) = box_to_rect(element) else {
            continue;
        };
        for offset in 0..thickness.max(1) {
            let thick_rect = Rect::at(rect.left() - offset, rect.top() - offset).of_size(
                rect.width() + (2 * offset) as u32,
                rect.height() + (2 * offset) as u32,
            );
            if is_rect_in_bounds(&thick_rect, img_width, img_height) {
                draw_hollow_rect_mut(img, thick_rect, color);
            }
        }
    }
}

/// Draws each contour as a closed polyline.
pub fn draw_contours(img: &mut RgbImage, contours: &[&Polygon], color: Rgb<u8>) {
    for contour in contours {
        let points = &contour.points;
        if points.len() < 2 {
            continue;
        }
        for (i, start) in points.iter().enumerate() {
            let end = &points[(i + 1) % points.len()];
            draw_line_segment_mut(img, (start.x, start.y), (end.x, end.y), color);
        }
    }
}

/// Draws each alignment guide across the full image.
pub fn draw_alignment_lines(img: &mut RgbImage, lines: &[AlignmentLine]) {
    let (width, height) = (img.width() as f32, img.height() as f32);
    for line in lines {
        let position = line.position as f32;
        if line.kind.is_horizontal() {
            if position < 0.0 || position >= height {
                continue;
            }
            draw_line_segment_mut(
                img,
                (0.0, position),
                (width - 1.0, position),
                guide_color(line.kind),
            );
        } else {
            if position < 0.0 || position >= width {
                continue;
            }
            draw_line_segment_mut(
                img,
                (position, 0.0),
                (position, height - 1.0),
                guide_color(line.kind),
            );
        }
    }
}

/// Blends `color` into every pixel set in `mask`.
pub fn overlay_mask(img: &mut RgbImage, mask: &BinaryMask, color: Rgb<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (x, y) in mask.iter_set() {
        if x >= img.width() || y >= img.height() {
            continue;
        }
        let pixel = img.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = f32::from(pixel[c]) * (1.0 - alpha) + f32::from(color[c]) * alpha;
            pixel[c] = blended.round() as u8;
        }
    }
}

/// Renders a box detection on a copy of `image`.
pub fn create_box_visualization(
    image: &RgbImage,
    result: &BoxDetection,
    config: &VisualizationConfig,
    alignment: &[AlignmentLine],
) -> RgbImage {
    let mut vis_img = image.clone();
    if config.show_text_mask {
        overlay_mask(&mut vis_img, &result.text_mask, TEXT_MASK_COLOR, config.mask_alpha);
    }
    if config.show_alignment {
        draw_alignment_lines(&mut vis_img, alignment);
    }
    draw_boxes(
        &mut vis_img,
        &result.boxes,
        config.box_color,
        config.bbox_thickness,
    );
    vis_img
}

/// Renders a contour detection on a copy of `image`: contour outlines plus
/// their bounding boxes.
pub fn create_contour_visualization(
    image: &RgbImage,
    result: &ContourDetection,
    config: &VisualizationConfig,
) -> RgbImage {
    let mut vis_img = image.clone();
    if config.show_text_mask {
        overlay_mask(&mut vis_img, &result.text_mask, TEXT_MASK_COLOR, config.mask_alpha);
    }
    let contours: Vec<&Polygon> = result
        .regions
        .iter()
        .map(|region| &region.contour)
        .collect();
    draw_contours(&mut vis_img, &contours, config.contour_color);
    draw_boxes(&mut vis_img, &result.boxes(), config.box_color, 1);
    vis_img
}

/// Renders a box detection and saves it to `output_path`.
///
/// `alignment` is only drawn when [`VisualizationConfig::show_alignment`] is set.
pub fn visualize_boxes(
    image: &RgbImage,
    result: &BoxDetection,
    alignment: &[AlignmentLine],
    config: &VisualizationConfig,
    output_path: &Path,
) -> RegionResult<()> {
    info!(
        "Creating box visualization with {} boxes",
        result.boxes.len()
    );
    let vis_img = create_box_visualization(image, result, config, alignment);
    save_visualization(&vis_img, output_path)
}

/// Renders a contour detection and saves it to `output_path`.
pub fn visualize_contours(
    image: &RgbImage,
    result: &ContourDetection,
    config: &VisualizationConfig,
    output_path: &Path,
) -> RegionResult<()> {
    info!(
        "Creating contour visualization with {} regions",
        result.regions.len()
    );
    let vis_img = create_contour_visualization(image, result, config);
    save_visualization(&vis_img, output_path)
}

fn save_visualization(img: &RgbImage, output_path: &Path) -> RegionResult<()> {
    img.save(output_path).map_err(|e| {
        debug!("Saving {} failed: {}", output_path.display(), e);
        RegionError::ImageLoad(e)
    })?;
    info!("Visualization saved to: {}", output_path.display());
    Ok(())
}

fn guide_color(kind: AlignmentKind) -> Rgb<u8> {
    if kind.is_horizontal() {
        HORIZONTAL_GUIDE_COLOR
    } else {
        VERTICAL_GUIDE_COLOR
    }
}

fn is_rect_in_bounds(rect: &Rect, img_width: i32, img_height: i32) -> bool {
    rect.left() >= 0 && rect.top() >= 0 && rect.right() < img_width && rect.bottom() < img_height
}

/// Degenerate boxes have no drawable rectangle.
fn box_to_rect(element: &ElementBox) -> Option<Rect> {
    if element.width == 0 || element.height == 0 {
        return None;
    }
    Some(Rect::at(element.x as i32, element.y as i32).of_size(element.width, element.height))
}
