//! Region types produced by the contour path.

use crate::processors::geometry::{Contour, ElementBox};
use serde::{Deserialize, Serialize};

/// A contour paired with its contrast score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredContour {
    pub contour: Contour,
    /// Summed interior-to-ring color distance; never negative.
    pub score: f64,
}

impl ScoredContour {
    pub fn new(contour: Contour, score: f64) -> Self {
        Self { contour, score }
    }
}

/// A contour that survived ranking and the area/perimeter test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredRegion {
    pub contour: Contour,
    pub score: f64,
    /// Enclosed area in square pixels.
    pub area: f32,
    /// Closed boundary length in pixels.
    pub perimeter: f32,
    /// Bounding box of the contour, clamped to the image.
    pub bounding_box: ElementBox,
}

impl FilteredRegion {
    /// `area / perimeter`, the compactness measure used by the filter.
    pub fn compactness(&self) -> f32 {
        if self.perimeter > 0.0 {
            self.area / self.perimeter
        } else {
            0.0
        }
    }
}
