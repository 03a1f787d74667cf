//! # OAR Region
//!
//! A Rust library that locates candidate UI elements (buttons, panels, cards)
//! in static screenshots from edge geometry alone, using OCR output only to
//! keep text from turning into spurious regions.
//!
//! ## Features
//!
//! - Text occlusion masks built from any OCR engine's `(polygon, confidence)` output
//! - Gradient (Canny), perceptual (Canny + morphology) and difference-map edge extraction
//! - Connected-component boxes with order-dependent overlap merging
//! - External contours ranked by HSV interior/ring contrast
//! - Optional text-line, paragraph and alignment analysis on boxes
//! - Batch processing with rayon
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration validation and default constants
//! * [`domain`] - OCR collaborator interface and region result types
//! * [`pipeline`] - The [`ElementDetector`](pipeline::ElementDetector) and its configuration
//! * [`processors`] - Individual pipeline stages
//! * [`utils`] - Image loading, logging setup and visualization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oar_region::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ocr = StaticTextDetector::from_json_file("screenshot.ocr.json")?;
//! let detector = ElementDetector::new(DetectorConfig::default())?.with_text_detector(ocr);
//!
//! let image = load_image(Path::new("screenshot.png"))?;
//! let boxes = detector.detect_boxes(&image)?;
//! for element in &boxes.boxes {
//!     println!("{:?}", element);
//! }
//!
//! let contours = detector.detect_contours(&image)?;
//! for region in &contours.regions {
//!     println!("score {:.0} at {:?}", region.score, region.bounding_box);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Configuration
//!
//! ```rust
//! use oar_region::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DetectorConfig::from_json_str(r#"
//! {
//!   "text_mask": { "confidence_threshold": 0.85, "margin": 4 },
//!   "boxes": {
//!     "edge": { "type": "Perceptual", "edge_threshold": 0.2 },
//!     "min_area": 100,
//!     "overlap_threshold": 0.0
//!   },
//!   "contours": {
//!     "edge": { "type": "Gradient", "low_threshold": 1.0, "high_threshold": 600.0 },
//!     "scoring": { "margin": 5, "top_n": 12, "ratio_threshold": 1.0 }
//!   }
//! }
//! "#)?;
//! let detector = ElementDetector::new(config)?;
//! # let _ = detector;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oar_region::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - The detector and its configuration (`ElementDetector`, `DetectorConfig`)
/// - Results (`BoxDetection`, `ContourDetection`, `FilteredRegion`, `ElementBox`)
/// - The OCR collaborator interface (`TextDetector`, `TextDetection`, `StaticTextDetector`)
/// - Essential error and result types (`RegionError`, `RegionResult`)
/// - Basic image loading (`load_image`)
pub mod prelude {
    pub use crate::pipeline::{
        BoxDetection, BoxDetectionConfig, ContourDetection, ContourDetectionConfig,
        DetectionStats, DetectorConfig, ElementDetector,
    };

    pub use crate::domain::{FilteredRegion, StaticTextDetector, TextDetection, TextDetector};
    pub use crate::processors::{EdgeMethod, ElementBox, Polygon};

    pub use crate::core::{RegionError, RegionResult};

    pub use crate::utils::load_image;
}
