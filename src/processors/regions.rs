//! Region extraction from binary edge maps.
//!
//! Two strategies read the same (text-excluded) edge map:
//! - [`extract_component_boxes`] labels 8-connected edge pixels and keeps the
//!   bounding box of every component whose area is in range;
//! - [`extract_contours`] traces the outer boundary of each connected region,
//!   ignoring holes and anything nested inside another region.

use crate::processors::geometry::{Contour, ElementBox, Polygon};
use crate::processors::mask::{EdgeMap, TextMask};
use image::Luma;
use imageproc::contours::{BorderType, find_contours};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;
use tracing::debug;

/// Zeroes every edge pixel that lies under the text mask.
pub fn exclude_text(edges: &EdgeMap, text_mask: &TextMask) -> EdgeMap {
    edges.without(text_mask)
}

#[derive(Debug, Clone, Copy)]
struct ComponentBounds {
    x_min: u32,
    y_min: u32,
    x_max: u32,
    y_max: u32,
}

impl ComponentBounds {
    fn at(x: u32, y: u32) -> Self {
        Self {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    /// Span box: width and height are the distance between extreme pixels.
    fn to_box(self) -> ElementBox {
        ElementBox::new(
            self.x_min,
            self.y_min,
            self.x_max - self.x_min,
            self.y_max - self.y_min,
        )
    }
}

/// Bounding boxes of the 8-connected edge components with
/// `min_area <= width * height <= max_area`.
///
/// Boxes are returned in raster order of each component's first pixel.
/// `max_area = None` means unbounded.
pub fn extract_component_boxes(
    edges: &EdgeMap,
    min_area: u64,
    max_area: Option<u64>,
) -> Vec<ElementBox> {
    let labels = connected_components(edges.as_gray(), Connectivity::Eight, Luma([0u8]));

    let mut slots: HashMap<u32, usize> = HashMap::new();
    let mut bounds: Vec<ComponentBounds> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        match slots.get(&label) {
            Some(&slot) => bounds[slot].include(x, y),
            None => {
                slots.insert(label, bounds.len());
                bounds.push(ComponentBounds::at(x, y));
            }
        }
    }

    let boxes: Vec<ElementBox> = bounds
        .into_iter()
        .map(ComponentBounds::to_box)
        .filter(|b| {
            let area = b.area();
            area >= min_area && max_area.is_none_or(|max| area <= max)
        })
        .collect();

    debug!(
        components = slots.len(),
        kept = boxes.len(),
        min_area,
        ?max_area,
        "component boxes extracted"
    );
    boxes
}

/// Outer boundaries of the connected regions of `edges`.
///
/// Holes and regions nested inside a hole of another region are not
/// reported.
pub fn extract_contours(edges: &EdgeMap) -> Vec<Contour> {
    let contours: Vec<Contour> = find_contours::<i32>(edges.as_gray())
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(Polygon::from_contour)
        .filter(|c| !c.is_empty())
        .collect();

    debug!(contours = contours.len(), "external contours extracted");
    contours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::mask::BinaryMask;

    fn draw_frame(mask: &mut BinaryMask, x0: u32, y0: u32, x1: u32, y1: u32) {
        for x in x0..=x1 {
            mask.set(x, y0, true);
            mask.set(x, y1, true);
        }
        for y in y0..=y1 {
            mask.set(x0, y, true);
            mask.set(x1, y, true);
        }
    }

    #[test]
    fn test_blank_edge_map_yields_no_regions() {
        let edges = BinaryMask::new(40, 30);
        assert!(extract_component_boxes(&edges, 0, None).is_empty());
        assert!(extract_contours(&edges).is_empty());
    }

    #[test]
    fn test_component_box_uses_pixel_span() {
        let mut edges = BinaryMask::new(50, 50);
        draw_frame(&mut edges, 5, 10, 25, 30);
        let boxes = extract_component_boxes(&edges, 0, None);
        assert_eq!(boxes, vec![ElementBox::new(5, 10, 20, 20)]);
        assert!(boxes[0].fits_within(50, 50));
    }

    #[test]
    fn test_component_area_bounds() {
        let mut edges = BinaryMask::new(60, 60);
        draw_frame(&mut edges, 0, 0, 5, 5); // area 25
        draw_frame(&mut edges, 20, 20, 40, 40); // area 400

        assert_eq!(extract_component_boxes(&edges, 100, None).len(), 1);
        assert_eq!(extract_component_boxes(&edges, 0, Some(100)).len(), 1);
        assert_eq!(extract_component_boxes(&edges, 25, Some(400)).len(), 2);
        assert!(extract_component_boxes(&edges, 500, None).is_empty());
    }

    #[test]
    fn test_diagonal_pixels_form_one_component() {
        let mut edges = BinaryMask::new(20, 20);
        for i in 0..15 {
            edges.set(i, i, true);
        }
        let boxes = extract_component_boxes(&edges, 0, None);
        assert_eq!(boxes, vec![ElementBox::new(0, 0, 14, 14)]);
    }

    #[test]
    fn test_text_exclusion_removes_components() {
        let mut edges = BinaryMask::new(40, 40);
        draw_frame(&mut edges, 2, 2, 30, 30);
        let mut text = BinaryMask::new(40, 40);
        text.fill_rect(&ElementBox::new(0, 0, 39, 39));
        let masked = exclude_text(&edges, &text);
        assert!(masked.is_empty());
        assert!(extract_component_boxes(&masked, 0, None).is_empty());
    }

    #[test]
    fn test_contours_skip_nested_regions() {
        let mut edges = BinaryMask::new(60, 60);
        draw_frame(&mut edges, 5, 5, 50, 50);
        draw_frame(&mut edges, 20, 20, 30, 30);
        draw_frame(&mut edges, 54, 2, 58, 8);

        let contours = extract_contours(&edges);
        assert_eq!(contours.len(), 2);
        for contour in &contours {
            let (x_min, _, _, _) = contour.bounds().unwrap();
            assert!(x_min == 5.0 || x_min == 54.0);
        }
    }
}
