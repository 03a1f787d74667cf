//! Geometric primitives for region detection.
//!
//! This module provides the point, polygon and axis-aligned box types shared
//! by every stage, together with the algorithms they need: shoelace area,
//! closed perimeter, intersection-over-union and scanline polygon filling.

use imageproc::contours::Contour as ImageProcContour;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns true when both coordinates are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// A closed polygon described by its ordered vertices.
///
/// Used both for OCR text polygons and for region contours traced from an
/// edge map. The last vertex is implicitly connected back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// The vertices of the polygon, in boundary order.
    pub points: Vec<Point>,
}

/// Boundary of one connected edge region.
pub type Contour = Polygon;

impl Polygon {
    /// Creates a new polygon from a vector of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Creates an axis-aligned rectangle from its corners.
    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let points = vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ];
        Self { points }
    }

    /// Creates a polygon from a contour traced by imageproc.
    pub fn from_contour(contour: &ImageProcContour<i32>) -> Self {
        let points = contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true when the polygon has at least `min_points` vertices and
    /// every coordinate is finite.
    pub fn is_well_formed(&self, min_points: usize) -> bool {
        self.points.len() >= min_points.max(1) && self.points.iter().all(Point::is_finite)
    }

    /// Calculates the enclosed area using the shoelace formula.
    ///
    /// Returns 0.0 for polygons with fewer than 3 points.
    pub fn area(&self) -> f32 {
        if self.points.len() < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        let n = self.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area.abs() / 2.0
    }

    /// Calculates the length of the closed boundary.
    pub fn perimeter(&self) -> f32 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }

        let mut perimeter = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let dx = self.points[j].x - self.points[i].x;
            let dy = self.points[j].y - self.points[i].y;
            perimeter += (dx * dx + dy * dy).sqrt();
        }
        perimeter
    }

    /// Returns `(x_min, y_min, x_max, y_max)`, or None for an empty polygon.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let (x_min, x_max) = self.points.iter().map(|p| p.x).minmax().into_option()?;
        let (y_min, y_max) = self.points.iter().map(|p| p.y).minmax().into_option()?;
        Some((x_min, y_min, x_max, y_max))
    }

    /// Axis-aligned pixel box covering every vertex, clamped to the image.
    ///
    /// Follows the span convention of [`ElementBox`]: a polygon whose vertices
    /// lie on columns 2..=7 gets `x = 2, width = 5`.
    pub fn bounding_box(&self, image_width: u32, image_height: u32) -> Option<ElementBox> {
        let (x_min, y_min, x_max, y_max) = self.bounds()?;
        if !(x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite()) {
            return None;
        }
        let x = clamp_pixel(f64::from(x_min.floor()), image_width);
        let y = clamp_pixel(f64::from(y_min.floor()), image_height);
        let width = clamp_pixel(f64::from(x_max.floor()), image_width) - x;
        let height = clamp_pixel(f64::from(y_max.floor()), image_height) - y;
        Some(ElementBox::clamped(
            x,
            y,
            width,
            height,
            image_width,
            image_height,
        ))
    }
}

/// Converts a pixel coordinate to an integer clamped to `[-1, limit]`.
///
/// Everything outside that range behaves the same once boxes are clamped to
/// the image, and the clamp keeps later integer arithmetic from overflowing.
pub(crate) fn clamp_pixel(value: f64, limit: u32) -> i64 {
    value.clamp(-1.0, f64::from(limit)) as i64
}

/// An axis-aligned candidate region in integer pixel units.
///
/// `width` and `height` are spans between the extreme pixel coordinates, so a
/// box never extends past `image_width`/`image_height` once created through
/// [`ElementBox::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ElementBox {
    /// Creates a box without clamping.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box from possibly out-of-range values, clamping it to
    /// `[0, image_width] x [0, image_height]`.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let max_x = i64::from(image_width);
        let max_y = i64::from(image_height);
        let left = x.clamp(0, max_x);
        let top = y.clamp(0, max_y);
        let right = x.saturating_add(width.max(0)).clamp(left, max_x);
        let bottom = y.saturating_add(height.max(0)).clamp(top, max_y);
        Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }

    /// Exclusive right edge (`x + width`).
    #[inline]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge (`y + height`), saturating at `u32::MAX`.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Area in square pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    /// Returns true if the box lies inside an image of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(image_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(image_height)
    }

    /// Area shared with `other`. Boxes that only touch share no area.
    pub fn intersection_area(&self, other: &ElementBox) -> u64 {
        let x_left = self.x.max(other.x);
        let y_top = self.y.max(other.y);
        let x_right = self.right().min(other.right());
        let y_bottom = self.bottom().min(other.bottom());

        if x_right < x_left || y_bottom < y_top {
            return 0;
        }
        u64::from(x_right - x_left) * u64::from(y_bottom - y_top)
    }

    /// Intersection over union, in `[0, 1]`.
    ///
    /// Disjoint boxes and boxes whose union is empty yield exactly 0.0.
    pub fn iou(&self, other: &ElementBox) -> f32 {
        let intersection = self.intersection_area(other);
        if intersection == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            return 0.0;
        }
        (intersection as f64 / union as f64) as f32
    }

    /// Smallest box containing both `self` and `other`.
    pub fn enclosing(&self, other: &ElementBox) -> ElementBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        ElementBox::new(x, y, right - x, bottom - y)
    }
}

/// Reusable buffer for scanline polygon rasterization.
pub(crate) struct ScanlineBuffer {
    /// Intersections of the scanline with polygon edges.
    pub(crate) intersections: Vec<f32>,
}

impl ScanlineBuffer {
    /// Creates a new scanline buffer sized for `max_polygon_points` vertices.
    pub(crate) fn new(max_polygon_points: usize) -> Self {
        Self {
            intersections: Vec::with_capacity(max_polygon_points),
        }
    }

    /// Computes the inclusive pixel spans of row `y` that lie inside `polygon`.
    ///
    /// Vertices are treated as pixel centres. Spans are clipped to
    /// `0..width`; the callback receives `(x_start, x_end)` with `x_start <= x_end`.
    pub(crate) fn process_scanline(
        &mut self,
        y: u32,
        polygon: &Polygon,
        width: u32,
        mut on_span: impl FnMut(u32, u32),
    ) {
        self.intersections.clear();
        if width == 0 {
            return;
        }
        let scan_y = y as f32;

        let n = polygon.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let p1 = &polygon.points[i];
            let p2 = &polygon.points[j];

            if ((p1.y <= scan_y && scan_y < p2.y) || (p2.y <= scan_y && scan_y < p1.y))
                && (p2.y - p1.y).abs() > f32::EPSILON
            {
                // f64 keeps the product finite for vertices far outside the image;
                // interpolating from the nearer endpoint keeps small crossings exact
                let (x1, y1) = (f64::from(p1.x), f64::from(p1.y));
                let (x2, y2) = (f64::from(p2.x), f64::from(p2.y));
                let scan = f64::from(scan_y);
                let x = if (scan - y1).abs() <= (y2 - scan).abs() {
                    x1 + (scan - y1) * (x2 - x1) / (y2 - y1)
                } else {
                    x2 + (scan - y2) * (x2 - x1) / (y2 - y1)
                };
                self.intersections.push(x as f32);
            }
        }

        self.intersections
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let max_x = (width - 1) as f32;
        for chunk in self.intersections.chunks(2) {
            if chunk.len() == 2 {
                let x1 = chunk[0].ceil().max(0.0);
                let x2 = chunk[1].floor().min(max_x);
                if x1 <= x2 {
                    on_span(x1 as u32, x2 as u32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_polygon_area_and_perimeter() {
        let square = Polygon::from_coords(0.0, 0.0, 4.0, 3.0);
        assert!((square.area() - 12.0).abs() < EPS);
        assert!((square.perimeter() - 14.0).abs() < EPS);
    }

    #[test]
    fn test_single_point_polygon_is_degenerate() {
        let dot = Polygon::new(vec![Point::new(3.0, 3.0)]);
        assert_eq!(dot.area(), 0.0);
        assert_eq!(dot.perimeter(), 0.0);
    }

    #[test]
    fn test_well_formed_rejects_non_finite() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(f32::NAN, 1.0),
            Point::new(2.0, 2.0),
        ]);
        assert!(!poly.is_well_formed(3));
        assert!(Polygon::from_coords(0.0, 0.0, 1.0, 1.0).is_well_formed(3));
        assert!(!Polygon::new(vec![Point::new(0.0, 0.0)]).is_well_formed(3));
    }

    #[test]
    fn test_polygon_bounding_box_clamps() {
        let poly = Polygon::new(vec![
            Point::new(-5.0, 2.0),
            Point::new(30.0, 2.0),
            Point::new(30.0, 8.0),
        ]);
        let bbox = poly.bounding_box(20, 10).unwrap();
        assert_eq!(bbox, ElementBox::new(0, 2, 20, 6));
        assert!(bbox.fits_within(20, 10));
        assert!(Polygon::default().bounding_box(20, 10).is_none());
    }

    #[test]
    fn test_clamped_box_stays_in_bounds() {
        let b = ElementBox::clamped(-3, 5, 10, 100, 8, 20);
        assert_eq!(b, ElementBox::new(0, 5, 7, 15));
        let outside = ElementBox::clamped(50, 50, 5, 5, 8, 20);
        assert_eq!(outside.width, 0);
        assert_eq!(outside.height, 0);
        assert!(outside.fits_within(8, 20));
    }

    #[test]
    fn test_iou_reference_values() {
        let a = ElementBox::new(0, 0, 10, 10);
        let b = ElementBox::new(5, 5, 10, 10);
        let expected = 25.0 / 175.0;
        assert!((a.iou(&b) - expected).abs() < EPS);
        assert!((a.iou(&b) - b.iou(&a)).abs() < EPS);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_touching_and_degenerate_boxes() {
        let a = ElementBox::new(0, 0, 10, 10);
        let touching = ElementBox::new(10, 0, 10, 10);
        assert_eq!(a.iou(&touching), 0.0);

        let empty = ElementBox::new(3, 3, 0, 0);
        assert_eq!(empty.iou(&empty), 0.0);
        assert_eq!(a.iou(&empty), 0.0);
    }

    #[test]
    fn test_enclosing_box() {
        let a = ElementBox::new(0, 0, 10, 10);
        let b = ElementBox::new(5, 5, 10, 10);
        assert_eq!(a.enclosing(&b), ElementBox::new(0, 0, 15, 15));
    }

    #[test]
    fn test_scanline_spans_of_rectangle() {
        let rect = Polygon::from_coords(2.0, 1.0, 5.0, 4.0);
        let mut buffer = ScanlineBuffer::new(rect.len());

        let mut spans = Vec::new();
        buffer.process_scanline(2, &rect, 10, |a, b| spans.push((a, b)));
        assert_eq!(spans, vec![(2, 5)]);

        spans.clear();
        buffer.process_scanline(6, &rect, 10, |a, b| spans.push((a, b)));
        assert!(spans.is_empty());
    }

    #[test]
    fn test_scanline_clips_to_width() {
        let rect = Polygon::from_coords(-4.0, 0.0, 40.0, 4.0);
        let mut buffer = ScanlineBuffer::new(rect.len());
        let mut spans = Vec::new();
        buffer.process_scanline(1, &rect, 8, |a, b| spans.push((a, b)));
        assert_eq!(spans, vec![(0, 7)]);
    }

    #[test]
    fn test_bounding_box_of_far_polygon_is_clamped() {
        let huge = Polygon::from_coords(-1e30, -1e30, 1e30, 1e30);
        assert_eq!(huge.bounding_box(20, 10), Some(ElementBox::new(0, 0, 20, 10)));

        let left_of_image = Polygon::from_coords(-1e30, 2.0, -5.0, 4.0);
        assert_eq!(left_of_image.bounding_box(20, 10), Some(ElementBox::new(0, 2, 0, 2)));
    }

    #[test]
    fn test_edges_saturate_at_u32_max() {
        let element = ElementBox::new(u32::MAX - 1, u32::MAX - 2, 10, 10);
        assert_eq!(element.right(), u32::MAX);
        assert_eq!(element.bottom(), u32::MAX);
    }
}
