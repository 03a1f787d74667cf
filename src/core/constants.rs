//! Default parameter values shared across the pipeline.
//!
//! Each value mirrors the tuned defaults of the screenshot tooling these
//! stages were calibrated against.

/// Minimum OCR confidence for a detection to occlude edges.
pub const DEFAULT_TEXT_CONFIDENCE: f32 = 0.85;

/// Pixels added around each text rectangle.
pub const DEFAULT_TEXT_MARGIN: u32 = 4;

/// Low hysteresis threshold for the gradient edge path.
pub const DEFAULT_CANNY_LOW: f32 = 1.0;

/// High hysteresis threshold for the gradient edge path.
pub const DEFAULT_CANNY_HIGH: f32 = 600.0;

/// Fraction of the 8-bit range used as the perceptual low threshold.
pub const DEFAULT_EDGE_THRESHOLD: f32 = 0.2;

/// Chebyshev radius of the 5x5 square structuring element.
pub const DEFAULT_STRUCTURING_RADIUS: u8 = 2;

/// Chebyshev radius of the 3x3 dilation used by the difference map.
pub const DEFAULT_DIFFERENCE_DILATION: u8 = 1;

/// Minimum component bounding-box area for the box path.
pub const DEFAULT_MIN_AREA: u64 = 100;

/// IoU above which two boxes are merged.
pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.0;

/// Width of the sampling ring around each contour.
pub const DEFAULT_RING_MARGIN: u32 = 5;

/// Number of best-scoring contours kept before the ratio test.
pub const DEFAULT_TOP_N: usize = 12;

/// Minimum area-to-perimeter ratio for a contour to survive.
pub const DEFAULT_RATIO_THRESHOLD: f32 = 1.0;
