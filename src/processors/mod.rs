//! Image processing stages of the region detection pipeline.
//!
//! # Modules
//!
//! * `geometry` - Points, polygons, boxes, IoU and scanline filling
//! * `mask` - Binary masks shared by the edge and text stages
//! * `color` - RGB to 8-bit HSV conversion
//! * `edges` - Gradient, perceptual and difference-map edge extraction
//! * `text_mask` - Text occlusion masks from OCR detections
//! * `regions` - Connected-component boxes and external contours
//! * `merge` - Order-dependent overlap merging of boxes
//! * `scoring` - Interior/ring contrast scoring and ratio filtering
//! * `layout` - Text-line and paragraph merging, alignment analysis

pub mod color;
pub mod edges;
pub mod geometry;
pub mod layout;
pub mod mask;
pub mod merge;
pub mod regions;
pub mod scoring;
pub mod text_mask;

pub use color::{HsvImage, rgb_to_hsv, rgb_to_hsv_pixel};
pub use edges::{EdgeExtractor, EdgeMethod, extract_edges};
pub use geometry::{Contour, ElementBox, Point, Polygon};
pub use layout::{
    AlignmentConfig, AlignmentKind, AlignmentLine, LineMergeConfig, ParagraphMergeConfig,
    alignment_groups, alignment_lines, alignment_ratio, merge_paragraphs, merge_text_lines,
    organization_score,
};
pub use mask::{BinaryMask, EdgeMap, TextMask};
pub use merge::merge_overlapping_boxes;
pub use regions::{exclude_text, extract_component_boxes, extract_contours};
pub use scoring::{ScoringConfig, rank_and_filter, score_contour, score_contours};
pub use text_mask::{
    TextMaskBuilder, TextMaskConfig, TextMaskOutcome, TextMaskShape, build_text_mask,
};
