//! Overlap merging of candidate boxes.
//!
//! Boxes are sorted by ascending area, then a single forward worklist pass
//! folds every later box whose IoU with the current box exceeds the threshold
//! into the current box. After a merge the scan continues at the same `j`, so
//! the grown box is tested against the next candidate, but boxes that were
//! already passed are never revisited. Chains of transitive overlaps can
//! therefore end up in more than one box depending on their order; callers
//! that need a full transitive merge should iterate until the count is stable.

use crate::processors::geometry::ElementBox;
use tracing::debug;

/// Merges boxes whose IoU is strictly greater than `overlap_threshold`.
///
/// The result is in ascending-area order of the pre-merge boxes, with merged
/// boxes taking the position of their smallest member.
pub fn merge_overlapping_boxes(boxes: &[ElementBox], overlap_threshold: f32) -> Vec<ElementBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut boxes = boxes.to_vec();
    // stable: equal areas keep input order
    boxes.sort_by_key(ElementBox::area);

    let input = boxes.len();
    let mut i = 0;
    while i < boxes.len() {
        let mut j = i + 1;
        while j < boxes.len() {
            if boxes[i].iou(&boxes[j]) > overlap_threshold {
                boxes[i] = boxes[i].enclosing(&boxes[j]);
                boxes.remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }

    debug!(
        input,
        output = boxes.len(),
        overlap_threshold,
        "overlapping boxes merged"
    );
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_pair_merges_to_enclosing_box() {
        let boxes = [ElementBox::new(0, 0, 10, 10), ElementBox::new(5, 5, 10, 10)];
        let merged = merge_overlapping_boxes(&boxes, 0.0);
        assert_eq!(merged, vec![ElementBox::new(0, 0, 15, 15)]);
    }

    #[test]
    fn test_disjoint_boxes_kept_in_area_order() {
        let big = ElementBox::new(50, 50, 20, 20);
        let small = ElementBox::new(0, 0, 10, 10);
        let merged = merge_overlapping_boxes(&[big, small], 0.0);
        assert_eq!(merged, vec![small, big]);
    }

    #[test]
    fn test_touching_boxes_do_not_merge() {
        let a = ElementBox::new(0, 0, 10, 10);
        let b = ElementBox::new(10, 0, 10, 10);
        assert_eq!(merge_overlapping_boxes(&[a, b], 0.0), vec![a, b]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let a = ElementBox::new(0, 0, 10, 10);
        let b = ElementBox::new(5, 5, 10, 10);
        let iou = a.iou(&b);
        assert_eq!(merge_overlapping_boxes(&[a, b], iou).len(), 2);
        assert_eq!(merge_overlapping_boxes(&[a, b], iou - 1e-4).len(), 1);
    }

    #[test]
    fn test_equal_areas_keep_input_order() {
        let a = ElementBox::new(40, 0, 5, 5);
        let b = ElementBox::new(0, 0, 5, 5);
        let c = ElementBox::new(20, 20, 5, 5);
        assert_eq!(merge_overlapping_boxes(&[a, b, c], 0.0), vec![a, b, c]);
    }

    #[test]
    fn test_grown_box_absorbs_later_boxes() {
        // a merges with b, and the enclosing box then reaches c
        let a = ElementBox::new(0, 0, 4, 4);
        let b = ElementBox::new(2, 2, 6, 6);
        let c = ElementBox::new(7, 7, 10, 10);
        let merged = merge_overlapping_boxes(&[c, b, a], 0.0);
        assert_eq!(merged, vec![ElementBox::new(0, 0, 17, 17)]);
    }

    #[test]
    fn test_transitive_chain_can_under_merge() {
        // sorted order: a (16), b (25), c (600). a grows into c and then
        // overlaps b, but b has already been passed by the scan.
        let a = ElementBox::new(0, 0, 4, 4);
        let b = ElementBox::new(30, 0, 5, 5);
        let c = ElementBox::new(2, 2, 30, 20);
        let merged = merge_overlapping_boxes(&[a, b, c], 0.0);
        assert_eq!(merged, vec![ElementBox::new(0, 0, 32, 22), b]);
        assert!(merged[0].iou(&merged[1]) > 0.0);

        // a second pass collapses the leftover pair
        assert_eq!(
            merge_overlapping_boxes(&merged, 0.0),
            vec![ElementBox::new(0, 0, 35, 22)]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let boxes = [
            ElementBox::new(0, 0, 10, 10),
            ElementBox::new(5, 5, 10, 10),
            ElementBox::new(40, 40, 8, 8),
            ElementBox::new(44, 44, 2, 2),
            ElementBox::new(80, 0, 3, 30),
        ];
        let once = merge_overlapping_boxes(&boxes, 0.0);
        let twice = merge_overlapping_boxes(&once, 0.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_overlapping_boxes(&[], 0.0).is_empty());
    }
}
