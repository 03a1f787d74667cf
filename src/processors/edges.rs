//! Edge extraction.
//!
//! Three interchangeable strategies turn an RGB screenshot into a binary
//! [`EdgeMap`]:
//!
//! * [`EdgeMethod::Gradient`] - Canny hysteresis on the luminance channel,
//!   optionally pre-smoothed. Suited to fine contour work.
//! * [`EdgeMethod::Perceptual`] - Canny with thresholds derived from a single
//!   sensitivity fraction, then dilation and closing with a square element so
//!   broken edge fragments of textured widgets join into one component.
//! * [`EdgeMethod::DifferenceMap`] - normalized Sobel magnitude, dilated and
//!   binarized. Keeps soft transitions that hysteresis would drop.
//!
//! `imageproc::edges::canny` blurs its input with a Gaussian of sigma 1.4
//! before computing gradients, which matches a 5x5 smoothing pass. Any
//! `blur_sigma` on the gradient path is applied on top of that.

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW, DEFAULT_DIFFERENCE_DILATION,
    DEFAULT_EDGE_THRESHOLD, DEFAULT_STRUCTURING_RADIUS,
};
use crate::core::RegionResult;
use crate::processors::mask::EdgeMap;
use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Edge extraction strategy and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EdgeMethod {
    /// Canny-style double threshold with 8-connected hysteresis.
    Gradient {
        /// Gradient magnitude below which a pixel is never an edge.
        #[serde(default = "default_canny_low")]
        low_threshold: f32,
        /// Gradient magnitude above which a pixel is always an edge.
        #[serde(default = "default_canny_high")]
        high_threshold: f32,
        /// Sigma of an extra Gaussian pass before Canny's own sigma 1.4 blur.
        /// None (the default) relies on Canny's smoothing alone.
        #[serde(default)]
        blur_sigma: Option<f32>,
    },
    /// Canny with `edge_threshold * 255` / `edge_threshold * 510` thresholds,
    /// followed by dilation then closing.
    Perceptual {
        /// Sensitivity in `(0, 1]`; lower finds more edges.
        #[serde(default = "default_edge_threshold")]
        edge_threshold: f32,
        /// Chebyshev radius of the square structuring element (2 = 5x5).
        #[serde(default = "default_structuring_radius")]
        structuring_radius: u8,
    },
    /// Sobel magnitude normalized to 0..255, dilated, kept above `threshold`.
    DifferenceMap {
        /// Chebyshev radius of the dilation (1 = 3x3).
        #[serde(default = "default_difference_dilation")]
        dilation_radius: u8,
        /// Normalized magnitude a pixel must exceed to count as an edge.
        #[serde(default)]
        threshold: u8,
    },
}

fn default_canny_low() -> f32 {
    DEFAULT_CANNY_LOW
}

fn default_canny_high() -> f32 {
    DEFAULT_CANNY_HIGH
}

fn default_edge_threshold() -> f32 {
    DEFAULT_EDGE_THRESHOLD
}

fn default_structuring_radius() -> u8 {
    DEFAULT_STRUCTURING_RADIUS
}

fn default_difference_dilation() -> u8 {
    DEFAULT_DIFFERENCE_DILATION
}

impl EdgeMethod {
    /// Gradient path with the given thresholds and no extra pre-smoothing.
    pub fn gradient(low_threshold: f32, high_threshold: f32) -> Self {
        Self::Gradient {
            low_threshold,
            high_threshold,
            blur_sigma: None,
        }
    }

    /// Perceptual path with the default 5x5 structuring element.
    pub fn perceptual(edge_threshold: f32) -> Self {
        Self::Perceptual {
            edge_threshold,
            structuring_radius: DEFAULT_STRUCTURING_RADIUS,
        }
    }

    /// Difference map with a 3x3 dilation and no extra threshold.
    pub fn difference_map() -> Self {
        Self::DifferenceMap {
            dilation_radius: DEFAULT_DIFFERENCE_DILATION,
            threshold: 0,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gradient { .. } => "gradient",
            Self::Perceptual { .. } => "perceptual",
            Self::DifferenceMap { .. } => "difference_map",
        }
    }
}

impl Default for EdgeMethod {
    fn default() -> Self {
        Self::gradient(DEFAULT_CANNY_LOW, DEFAULT_CANNY_HIGH)
    }
}

impl ConfigValidator for EdgeMethod {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Gradient {
                low_threshold,
                high_threshold,
                blur_sigma,
            } => {
                self.validate_non_negative_f32(*low_threshold, "low_threshold")?;
                self.validate_non_negative_f32(*high_threshold, "high_threshold")?;
                if low_threshold > high_threshold {
                    return Err(ConfigError::InvalidConfig {
                        message: format!(
                            "low_threshold ({}) must not exceed high_threshold ({})",
                            low_threshold, high_threshold
                        ),
                    });
                }
                if let Some(sigma) = blur_sigma {
                    self.validate_positive_f32(*sigma, "blur_sigma")?;
                }
                Ok(())
            }
            Self::Perceptual { edge_threshold, .. } => {
                self.validate_positive_f32(*edge_threshold, "edge_threshold")?;
                self.validate_f32_range(*edge_threshold, 0.0, 1.0, "edge_threshold")
            }
            Self::DifferenceMap { .. } => Ok(()),
        }
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Produces binary edge maps from RGB images.
#[derive(Debug, Clone)]
pub struct EdgeExtractor {
    method: EdgeMethod,
}

impl EdgeExtractor {
    /// Creates an extractor, rejecting invalid parameters.
    pub fn new(method: EdgeMethod) -> RegionResult<Self> {
        method.validate()?;
        Ok(Self { method })
    }

    pub fn method(&self) -> &EdgeMethod {
        &self.method
    }

    /// Runs the configured strategy on `image`.
    pub fn extract(&self, image: &RgbImage) -> EdgeMap {
        let gray = imageops::grayscale(image);
        self.extract_gray(&gray)
    }

    /// Runs the configured strategy on an already single-channel image.
    pub fn extract_gray(&self, gray: &GrayImage) -> EdgeMap {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return EdgeMap::new(width, height);
        }

        let edges = match &self.method {
            EdgeMethod::Gradient {
                low_threshold,
                high_threshold,
                blur_sigma,
            } => gradient_edges(gray, *low_threshold, *high_threshold, *blur_sigma),
            EdgeMethod::Perceptual {
                edge_threshold,
                structuring_radius,
            } => perceptual_edges(gray, *edge_threshold, *structuring_radius),
            EdgeMethod::DifferenceMap {
                dilation_radius,
                threshold,
            } => difference_map_edges(gray, *dilation_radius, *threshold),
        };

        debug!(
            method = self.method.name(),
            edge_pixels = edges.count(),
            "edge extraction finished"
        );
        edges
    }
}

/// Extracts edges with the gradient strategy.
pub fn extract_edges(
    image: &RgbImage,
    low_threshold: f32,
    high_threshold: f32,
) -> RegionResult<EdgeMap> {
    let extractor = EdgeExtractor::new(EdgeMethod::gradient(low_threshold, high_threshold))?;
    Ok(extractor.extract(image))
}

fn gradient_edges(gray: &GrayImage, low: f32, high: f32, blur_sigma: Option<f32>) -> EdgeMap {
    let smoothed;
    let source = match blur_sigma {
        Some(sigma) if sigma > 0.0 => {
            smoothed = gaussian_blur_f32(gray, sigma);
            &smoothed
        }
        _ => gray,
    };
    EdgeMap::from(canny(source, low, high))
}

fn perceptual_edges(gray: &GrayImage, edge_threshold: f32, radius: u8) -> EdgeMap {
    let low = edge_threshold * 255.0;
    let high = low * 2.0;
    let edges = canny(gray, low, high);
    if radius == 0 {
        return EdgeMap::from(edges);
    }
    let dilated = morphology::dilate(&edges, Norm::LInf, radius);
    let closed = morphology::close(&dilated, Norm::LInf, radius);
    EdgeMap::from(closed)
}

fn difference_map_edges(gray: &GrayImage, dilation_radius: u8, threshold: u8) -> EdgeMap {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let (width, height) = gray.dimensions();

    let magnitudes: Vec<f32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| {
            let dx = f32::from(x[0]);
            let dy = f32::from(y[0]);
            (dx * dx + dy * dy).sqrt()
        })
        .collect();

    let (min, max) = magnitudes
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &m| {
            (lo.min(m), hi.max(m))
        });
    let range = max - min;

    let mut normalized = GrayImage::new(width, height);
    if range > 0.0 {
        for (pixel, &m) in normalized.pixels_mut().zip(magnitudes.iter()) {
            *pixel = Luma([((m - min) * 255.0 / range).round() as u8]);
        }
    }

    let dilated = if dilation_radius > 0 {
        morphology::dilate(&normalized, Norm::LInf, dilation_radius)
    } else {
        normalized
    };
    EdgeMap::from_gray(&dilated, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn panel_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        for y in 10..30 {
            for x in 15..45 {
                img.put_pixel(x, y, Rgb([20, 60, 200]));
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_has_no_edges() {
        let img = RgbImage::from_pixel(32, 32, Rgb([120, 120, 120]));
        for method in [
            EdgeMethod::default(),
            EdgeMethod::perceptual(DEFAULT_EDGE_THRESHOLD),
            EdgeMethod::difference_map(),
        ] {
            let edges = EdgeExtractor::new(method).unwrap().extract(&img);
            assert!(edges.is_empty());
            assert_eq!(edges.dimensions(), (32, 32));
        }
    }

    #[test]
    fn test_gradient_edges_trace_panel_border() {
        let edges = extract_edges(&panel_image(), 50.0, 150.0).unwrap();
        assert!(!edges.is_empty());
        // nothing far from the panel border
        assert!(!edges.get(2, 2));
        assert!(!edges.get(30, 20));
    }

    #[test]
    fn test_perceptual_edges_are_thickened() {
        let img = panel_image();
        let thin = EdgeExtractor::new(EdgeMethod::Perceptual {
            edge_threshold: 0.2,
            structuring_radius: 0,
        })
        .unwrap()
        .extract(&img);
        let thick = EdgeExtractor::new(EdgeMethod::perceptual(0.2))
            .unwrap()
            .extract(&img);
        assert!(thick.count() > thin.count());
    }

    #[test]
    fn test_difference_map_marks_transitions() {
        let edges = EdgeExtractor::new(EdgeMethod::difference_map())
            .unwrap()
            .extract(&panel_image());
        assert!(edges.get(15, 20));
        assert!(!edges.get(30, 20));
    }

    #[test]
    fn test_invalid_thresholds_are_rejected() {
        assert!(EdgeExtractor::new(EdgeMethod::gradient(200.0, 100.0)).is_err());
        assert!(EdgeExtractor::new(EdgeMethod::perceptual(0.0)).is_err());
        assert!(
            EdgeExtractor::new(EdgeMethod::Gradient {
                low_threshold: 1.0,
                high_threshold: 2.0,
                blur_sigma: Some(0.0),
            })
            .is_err()
        );
    }

    #[test]
    fn test_empty_image_yields_empty_map() {
        let img = RgbImage::new(0, 0);
        let edges = EdgeExtractor::new(EdgeMethod::default())
            .unwrap()
            .extract(&img);
        assert_eq!(edges.dimensions(), (0, 0));
    }

    #[test]
    fn test_edge_method_deserializes_with_defaults() {
        let method: EdgeMethod = serde_json::from_str(r#"{"type": "Perceptual"}"#).unwrap();
        assert_eq!(method, EdgeMethod::perceptual(DEFAULT_EDGE_THRESHOLD));

        let method: EdgeMethod =
            serde_json::from_str(r#"{"type": "Gradient", "high_threshold": 300.0}"#).unwrap();
        assert_eq!(method, EdgeMethod::gradient(DEFAULT_CANNY_LOW, 300.0));
    }

    #[test]
    fn test_gradient_default_relies_on_canny_smoothing() {
        assert_eq!(
            EdgeMethod::default(),
            EdgeMethod::Gradient {
                low_threshold: DEFAULT_CANNY_LOW,
                high_threshold: DEFAULT_CANNY_HIGH,
                blur_sigma: None,
            }
        );
        let method: EdgeMethod = serde_json::from_str(r#"{"type": "Gradient"}"#).unwrap();
        assert_eq!(method, EdgeMethod::default());

        let smoothed: EdgeMethod =
            serde_json::from_str(r#"{"type": "Gradient", "blur_sigma": 1.1}"#).unwrap();
        let extra = EdgeExtractor::new(smoothed).unwrap().extract(&panel_image());
        assert!(!extra.is_empty());
    }
}
