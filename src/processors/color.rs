//! Color space conversion for contour scoring.
//!
//! HSV values use the common 8-bit layout: hue in `[0, 180)` (degrees halved),
//! saturation and value in `[0, 255]`. Scores computed on these channels are
//! therefore comparable with tooling that uses the same convention.

use image::{ImageBuffer, Rgb, RgbImage};

/// An HSV image stored in an RGB-shaped buffer: channel 0 = H, 1 = S, 2 = V.
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Converts a single RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv_pixel(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let mut hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let h = (hue / 2.0).round();
    // 359.x degrees rounds up to 180 which wraps to 0
    let h = if h >= 180.0 { 0.0 } else { h };

    [h as u8, saturation.round().min(255.0) as u8, max as u8]
}

/// Converts an RGB image to HSV.
pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    let mut hsv = HsvImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(hsv.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv_pixel(src.0));
    }
    hsv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv_pixel([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn test_grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv_pixel([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv_pixel([128, 128, 128]), [0, 0, 128]);
        assert_eq!(rgb_to_hsv_pixel([255, 255, 255]), [0, 0, 255]);
    }

    #[test]
    fn test_negative_hue_wraps() {
        // magenta-ish red: hue just below 360 degrees
        let [h, s, v] = rgb_to_hsv_pixel([255, 0, 10]);
        assert!(h >= 175 && h < 180);
        assert_eq!(s, 255);
        assert_eq!(v, 255);
    }

    #[test]
    fn test_image_conversion_preserves_dimensions() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([0, 255, 0]));
        let hsv = rgb_to_hsv(&rgb);
        assert_eq!(hsv.dimensions(), (3, 2));
        assert_eq!(hsv.get_pixel(2, 1).0, [60, 255, 255]);
    }
}
