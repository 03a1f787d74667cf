//! Binary masks sharing the coordinate space of the source image.
//!
//! A [`BinaryMask`] stores set pixels as 255 and clear pixels as 0 in a
//! [`GrayImage`], so it can be handed to `imageproc` routines (morphology,
//! contour tracing, labelling) without conversion.

use crate::processors::geometry::{ElementBox, Polygon, ScanlineBuffer};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

const SET: Luma<u8> = Luma([255]);
const CLEAR: Luma<u8> = Luma([0]);

/// A binary grid with the same dimensions as the analysed image.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    inner: GrayImage,
}

/// Edge pixels produced by the edge extractor.
pub type EdgeMap = BinaryMask;

/// Pixels attributed to detected text.
pub type TextMask = BinaryMask;

impl BinaryMask {
    /// Creates an all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: GrayImage::new(width, height),
        }
    }

    /// Binarizes a grayscale image: every pixel strictly above `threshold` is set.
    pub fn from_gray(image: &GrayImage, threshold: u8) -> Self {
        let mut inner = image.clone();
        for pixel in inner.pixels_mut() {
            *pixel = if pixel[0] > threshold { SET } else { CLEAR };
        }
        Self { inner }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Returns whether `(x, y)` is set. Out-of-range coordinates read as clear.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.inner.get_pixel(x, y)[0] != 0
    }

    /// Sets or clears `(x, y)`. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width() && y < self.height() {
            self.inner.put_pixel(x, y, if value { SET } else { CLEAR });
        }
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.inner.pixels().filter(|p| p[0] != 0).count()
    }

    /// Returns true when no pixel is set.
    pub fn is_empty(&self) -> bool {
        self.inner.pixels().all(|p| p[0] == 0)
    }

    /// Sets every pixel inside `rect`, clipped to the mask.
    ///
    /// The box is inclusive on all sides: `ElementBox::new(2, 2, 3, 3)` sets
    /// columns and rows 2 through 5.
    pub fn fill_rect(&mut self, rect: &ElementBox) {
        if self.width() == 0 || self.height() == 0 {
            return;
        }
        let x_end = rect.right().min(self.width() - 1);
        let y_end = rect.bottom().min(self.height() - 1);
        if rect.x > x_end || rect.y > y_end {
            return;
        }
        for y in rect.y..=y_end {
            for x in rect.x..=x_end {
                self.inner.put_pixel(x, y, SET);
            }
        }
    }

    /// Sets every pixel covered by `polygon`, boundary included.
    pub fn fill_polygon(&mut self, polygon: &Polygon) {
        if polygon.is_empty() || self.width() == 0 || self.height() == 0 {
            return;
        }

        let mut buffer = ScanlineBuffer::new(polygon.len());
        let width = self.width();
        if let Some((_, y_min, _, y_max)) = polygon.bounds() {
            let start_y = y_min.ceil().max(0.0) as u32;
            let end_y = y_max.floor().min((self.height() - 1) as f32);
            if end_y >= 0.0 {
                for y in start_y..=end_y as u32 {
                    let inner = &mut self.inner;
                    buffer.process_scanline(y, polygon, width, |x1, x2| {
                        for x in x1..=x2 {
                            inner.put_pixel(x, y, SET);
                        }
                    });
                }
            }
        }

        self.draw_outline(polygon);
    }

    /// Sets the pixels along the closed boundary of `polygon`.
    ///
    /// Edges are clipped to the mask first, so vertices far outside it cost
    /// nothing extra.
    pub fn draw_outline(&mut self, polygon: &Polygon) {
        let n = polygon.len();
        let (width, height) = (f64::from(self.width()), f64::from(self.height()));
        for (i, start) in polygon.points.iter().enumerate() {
            let end = &polygon.points[(i + 1) % n];
            if let Some((from, to)) = clip_segment(
                (f64::from(start.x), f64::from(start.y)),
                (f64::from(end.x), f64::from(end.y)),
                width,
                height,
            ) {
                draw_line_segment_mut(&mut self.inner, from, to, SET);
            }
            if start.x >= 0.0 && start.y >= 0.0 {
                self.set(start.x as u32, start.y as u32, true);
            }
        }
    }

    /// Clears every pixel that is set in `other` (`self & !other`).
    ///
    /// Masks of different sizes are combined over their shared area.
    pub fn subtract(&mut self, other: &BinaryMask) {
        let width = self.width().min(other.width());
        let height = self.height().min(other.height());
        for y in 0..height {
            for x in 0..width {
                if other.get(x, y) {
                    self.inner.put_pixel(x, y, CLEAR);
                }
            }
        }
    }

    /// Returns a copy with every pixel of `other` cleared.
    pub fn without(&self, other: &BinaryMask) -> BinaryMask {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    /// Iterates over the coordinates of set pixels in row-major order.
    pub fn iter_set(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.inner
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| (x, y))
    }

    /// Borrows the underlying 0/255 image.
    pub fn as_gray(&self) -> &GrayImage {
        &self.inner
    }
}

/// Liang-Barsky clipping of a segment to `[-1, width] x [-1, height]`.
///
/// A clipped endpoint lies exactly on the window edge that cut it; its other
/// coordinate is interpolated from the nearer endpoint and clamped to the
/// window. Returns None when the segment misses the window.
fn clip_segment(
    start: (f64, f64),
    end: (f64, f64),
    width: f64,
    height: f64,
) -> Option<((f32, f32), (f32, f32))> {
    // signed distance to each window edge (left, right, top, bottom), positive inside
    let inside = |p: (f64, f64)| [p.0 + 1.0, width - p.0, p.1 + 1.0, height - p.1];
    let (from_start, from_end) = (inside(start), inside(end));

    // (t, 1 - t, cutting edge) for the entry and exit points
    let mut enter = (0.0_f64, 1.0_f64, None);
    let mut exit = (1.0_f64, 0.0_f64, None);
    for (edge, (a, b)) in from_start.into_iter().zip(from_end).enumerate() {
        if a < 0.0 && b < 0.0 {
            return None;
        }
        if a < 0.0 {
            let t = a / (a - b);
            if t > enter.0 {
                enter = (t, -b / (a - b), Some(edge));
            }
        } else if b < 0.0 {
            let t = a / (a - b);
            if t < exit.0 {
                exit = (t, -b / (a - b), Some(edge));
            }
        }
    }
    if enter.0 > exit.0 {
        return None;
    }

    let point = |(t, rest, edge): (f64, f64, Option<usize>)| {
        let along = |from: f64, to: f64, limit: f64| {
            let value = if t <= 0.5 {
                from + t * (to - from)
            } else {
                to - rest * (to - from)
            };
            value.clamp(-1.0, limit)
        };
        let x = match edge {
            Some(0) => -1.0,
            Some(1) => width,
            _ => along(start.0, end.0, width),
        };
        let y = match edge {
            Some(2) => -1.0,
            Some(3) => height,
            _ => along(start.1, end.1, height),
        };
        (x as f32, y as f32)
    };
    Some((point(enter), point(exit)))
}

impl From<GrayImage> for BinaryMask {
    /// Treats every non-zero pixel as set.
    fn from(image: GrayImage) -> Self {
        Self::from_gray(&image, 0)
    }
}
