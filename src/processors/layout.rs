//! Layout analysis on detected boxes.
//!
//! Optional post-processing for the box path: joining fragments of one text
//! line, stacking lines into paragraphs, and measuring how well the final
//! boxes line up with each other.

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::geometry::ElementBox;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Thresholds for joining boxes that belong to the same text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineMergeConfig {
    /// Allowed relative height difference (`min / max >= 1 - tolerance`).
    pub height_tolerance: f32,
    /// Allowed centre offset relative to the taller box.
    pub vertical_tolerance: f32,
    /// Maximum horizontal gap as a multiple of the taller box's height.
    pub horizontal_gap_ratio: f32,
}

impl Default for LineMergeConfig {
    fn default() -> Self {
        Self {
            height_tolerance: 0.3,
            vertical_tolerance: 0.5,
            horizontal_gap_ratio: 1.0,
        }
    }
}

impl ConfigValidator for LineMergeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.height_tolerance, 0.0, 1.0, "height_tolerance")?;
        self.validate_f32_range(self.vertical_tolerance, 0.0, 1.0, "vertical_tolerance")?;
        self.validate_non_negative_f32(self.horizontal_gap_ratio, "horizontal_gap_ratio")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Thresholds for stacking text lines into paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphMergeConfig {
    /// Maximum left-edge offset as a fraction of the wider box's width.
    pub left_align_tolerance: f32,
    /// Allowed relative height difference between lines.
    pub height_tolerance: f32,
    /// Maximum vertical gap as a multiple of the taller box's height.
    pub vertical_gap_ratio: f32,
}

impl Default for ParagraphMergeConfig {
    fn default() -> Self {
        Self {
            left_align_tolerance: 0.1,
            height_tolerance: 0.4,
            vertical_gap_ratio: 0.5,
        }
    }
}

impl ConfigValidator for ParagraphMergeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_non_negative_f32(self.left_align_tolerance, "left_align_tolerance")?;
        self.validate_f32_range(self.height_tolerance, 0.0, 1.0, "height_tolerance")?;
        self.validate_non_negative_f32(self.vertical_gap_ratio, "vertical_gap_ratio")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Pixel tolerances for each alignment axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub center_x: u32,
    pub center_y: u32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            left: 10,
            right: 10,
            top: 10,
            bottom: 10,
            center_x: 10,
            center_y: 10,
        }
    }
}

/// The box edge or centre an alignment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentKind {
    Left,
    Right,
    Top,
    Bottom,
    CenterX,
    CenterY,
}

impl AlignmentKind {
    pub const ALL: [AlignmentKind; 6] = [
        AlignmentKind::Left,
        AlignmentKind::Right,
        AlignmentKind::Top,
        AlignmentKind::Bottom,
        AlignmentKind::CenterX,
        AlignmentKind::CenterY,
    ];

    /// True for kinds measured along the y axis, drawn as horizontal lines.
    pub fn is_horizontal(self) -> bool {
        matches!(
            self,
            AlignmentKind::Top | AlignmentKind::Bottom | AlignmentKind::CenterY
        )
    }

    fn coordinate(self, b: &ElementBox) -> i64 {
        let (x, y, w, h) = (
            i64::from(b.x),
            i64::from(b.y),
            i64::from(b.width),
            i64::from(b.height),
        );
        match self {
            AlignmentKind::Left => x,
            AlignmentKind::Right => x + w,
            AlignmentKind::Top => y,
            AlignmentKind::Bottom => y + h,
            AlignmentKind::CenterX => x + w / 2,
            AlignmentKind::CenterY => y + h / 2,
        }
    }

    fn tolerance(self, config: &AlignmentConfig) -> i64 {
        i64::from(match self {
            AlignmentKind::Left => config.left,
            AlignmentKind::Right => config.right,
            AlignmentKind::Top => config.top,
            AlignmentKind::Bottom => config.bottom,
            AlignmentKind::CenterX => config.center_x,
            AlignmentKind::CenterY => config.center_y,
        })
    }
}

/// A guide shared by at least two boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentLine {
    pub kind: AlignmentKind,
    /// Mean coordinate of the aligned boxes (x for vertical lines, y for horizontal).
    pub position: i64,
    /// Number of boxes on this line.
    pub members: usize,
}

fn line_merge_ok(a: &ElementBox, b: &ElementBox, config: &LineMergeConfig) -> bool {
    let max_height = a.height.max(b.height) as f32;
    if max_height <= 0.0 {
        return false;
    }
    let height_ratio = a.height.min(b.height) as f32 / max_height;
    let vertical_alignment = 1.0 - (a.center_y() - b.center_y()).abs() / max_height;
    let gap = axis_gap(a.x, a.right(), b.x, b.right()) as f32;

    height_ratio >= 1.0 - config.height_tolerance
        && vertical_alignment >= 1.0 - config.vertical_tolerance
        && gap <= max_height * config.horizontal_gap_ratio
}

fn paragraph_merge_ok(a: &ElementBox, b: &ElementBox, config: &ParagraphMergeConfig) -> bool {
    let max_height = a.height.max(b.height) as f32;
    let height_ratio = if max_height > 0.0 {
        a.height.min(b.height) as f32 / max_height
    } else {
        0.0
    };
    let max_width = a.width.max(b.width) as f32;
    let left_distance = a.x.abs_diff(b.x) as f32;
    let gap = axis_gap(a.y, a.bottom(), b.y, b.bottom()) as f32;

    left_distance <= max_width * config.left_align_tolerance
        && height_ratio >= 1.0 - config.height_tolerance
        && gap <= max_height * config.vertical_gap_ratio
}

/// Distance between two intervals on one axis; 0 when they overlap or touch.
fn axis_gap(start_a: u32, end_a: u32, start_b: u32, end_b: u32) -> u32 {
    if end_b < start_a {
        start_a - end_b
    } else if end_a < start_b {
        start_b - end_a
    } else {
        0
    }
}

/// Greedy top-to-bottom merge: each box joins the first accumulated box that
/// accepts it, or starts a new one.
fn greedy_merge(
    boxes: &[ElementBox],
    accepts: impl Fn(&ElementBox, &ElementBox) -> bool,
) -> Vec<ElementBox> {
    let mut merged: Vec<ElementBox> = Vec::with_capacity(boxes.len());
    for current in boxes.iter().sorted_by_key(|b| b.y) {
        match merged.iter_mut().find(|existing| accepts(current, existing)) {
            Some(existing) => *existing = existing.enclosing(current),
            None => merged.push(*current),
        }
    }
    merged
}

/// Joins boxes that look like fragments of the same text line.
pub fn merge_text_lines(boxes: &[ElementBox], config: &LineMergeConfig) -> Vec<ElementBox> {
    greedy_merge(boxes, |a, b| line_merge_ok(a, b, config))
}

/// Joins left-aligned lines of similar height that are stacked closely.
pub fn merge_paragraphs(boxes: &[ElementBox], config: &ParagraphMergeConfig) -> Vec<ElementBox> {
    greedy_merge(boxes, |a, b| paragraph_merge_ok(a, b, config))
}

/// Groups sorted coordinates: each value joins the first group whose first
/// member is within `tolerance`.
pub fn alignment_groups(coords: &[i64], tolerance: i64) -> Vec<Vec<i64>> {
    let mut groups: Vec<Vec<i64>> = Vec::new();
    for &coord in coords.iter().sorted() {
        match groups
            .iter_mut()
            .find(|group| (coord - group[0]).abs() <= tolerance)
        {
            Some(group) => group.push(coord),
            None => groups.push(vec![coord]),
        }
    }
    groups
}

/// Every alignment guide shared by two or more boxes.
pub fn alignment_lines(boxes: &[ElementBox], config: &AlignmentConfig) -> Vec<AlignmentLine> {
    AlignmentKind::ALL
        .iter()
        .flat_map(|&kind| {
            let coords: Vec<i64> = boxes.iter().map(|b| kind.coordinate(b)).collect();
            alignment_groups(&coords, kind.tolerance(config))
                .into_iter()
                .filter(|group| group.len() > 1)
                .map(move |group| AlignmentLine {
                    kind,
                    position: group.iter().sum::<i64>() / group.len() as i64,
                    members: group.len(),
                })
        })
        .collect()
}

fn axis_fully_aligned(
    boxes: &[ElementBox],
    kinds: &[AlignmentKind],
    config: &AlignmentConfig,
) -> bool {
    kinds.iter().any(|&kind| {
        let coords: Vec<i64> = boxes.iter().map(|b| kind.coordinate(b)).collect();
        alignment_groups(&coords, kind.tolerance(config))
            .iter()
            .any(|group| group.len() == boxes.len())
    })
}

/// 1.0 when all boxes share both an x and a y alignment, 0.5 for one axis,
/// 0.0 otherwise or with fewer than two boxes.
pub fn alignment_ratio(boxes: &[ElementBox], config: &AlignmentConfig) -> f32 {
    if boxes.len() < 2 {
        return 0.0;
    }
    let x_aligned = axis_fully_aligned(
        boxes,
        &[AlignmentKind::Left, AlignmentKind::Right, AlignmentKind::CenterX],
        config,
    );
    let y_aligned = axis_fully_aligned(
        boxes,
        &[AlignmentKind::Top, AlignmentKind::Bottom, AlignmentKind::CenterY],
        config,
    );
    match (x_aligned, y_aligned) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}

/// Organization score in `[0, 100]`: `alignment_ratio^0.3 * 100`.
pub fn organization_score(boxes: &[ElementBox], config: &AlignmentConfig) -> f32 {
    if boxes.is_empty() {
        return 0.0;
    }
    (alignment_ratio(boxes, config).powf(0.3) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_on_one_line_merge() {
        let words = [
            ElementBox::new(10, 10, 30, 12),
            ElementBox::new(48, 10, 25, 12),
            ElementBox::new(80, 11, 40, 11),
        ];
        let lines = merge_text_lines(&words, &LineMergeConfig::default());
        assert_eq!(lines, vec![ElementBox::new(10, 10, 110, 12)]);
    }

    #[test]
    fn test_distant_or_mismatched_boxes_stay_apart() {
        let boxes = [
            ElementBox::new(10, 10, 30, 12),
            // gap of 60 > 12
            ElementBox::new(100, 10, 30, 12),
            // far taller
            ElementBox::new(45, 0, 30, 40),
        ];
        let lines = merge_text_lines(&boxes, &LineMergeConfig::default());
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_paragraph_merge_stacks_lines() {
        let lines = [
            ElementBox::new(20, 10, 200, 14),
            ElementBox::new(22, 28, 180, 14),
            ElementBox::new(20, 46, 190, 13),
            // indented far to the right
            ElementBox::new(150, 64, 60, 14),
        ];
        let paragraphs = merge_paragraphs(&lines, &ParagraphMergeConfig::default());
        // the grown first paragraph is too tall to accept the third line
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0], ElementBox::new(20, 10, 200, 32));
        assert_eq!(paragraphs[1], lines[2]);
    }

    #[test]
    fn test_alignment_groups_anchor_on_first_member() {
        let groups = alignment_groups(&[30, 0, 8, 16, 9], 10);
        assert_eq!(groups, vec![vec![0, 8, 9], vec![16], vec![30]]);
        assert!(alignment_groups(&[], 10).is_empty());
    }

    #[test]
    fn test_alignment_ratio_levels() {
        let config = AlignmentConfig::default();
        let column = [ElementBox::new(10, 0, 50, 20), ElementBox::new(12, 100, 80, 20)];
        assert_eq!(alignment_ratio(&column, &config), 0.5);

        let grid = [ElementBox::new(10, 10, 50, 20), ElementBox::new(14, 12, 50, 20)];
        assert_eq!(alignment_ratio(&grid, &config), 1.0);

        let scattered = [ElementBox::new(0, 0, 10, 10), ElementBox::new(200, 300, 40, 40)];
        assert_eq!(alignment_ratio(&scattered, &config), 0.0);
        assert_eq!(alignment_ratio(&scattered[..1], &config), 0.0);
    }

    #[test]
    fn test_organization_score() {
        let config = AlignmentConfig::default();
        let grid = [ElementBox::new(10, 10, 50, 20), ElementBox::new(14, 12, 50, 20)];
        assert!((organization_score(&grid, &config) - 100.0).abs() < 1e-4);

        let column = [ElementBox::new(10, 0, 50, 20), ElementBox::new(12, 100, 80, 20)];
        let expected = 0.5f32.powf(0.3) * 100.0;
        assert!((organization_score(&column, &config) - expected).abs() < 1e-3);

        assert_eq!(organization_score(&[], &config), 0.0);
    }

    #[test]
    fn test_alignment_lines_need_two_members() {
        let boxes = [
            ElementBox::new(10, 10, 40, 20),
            ElementBox::new(12, 80, 40, 20),
            ElementBox::new(300, 200, 10, 10),
        ];
        let lines = alignment_lines(&boxes, &AlignmentConfig::default());
        let left = lines
            .iter()
            .find(|l| l.kind == AlignmentKind::Left)
            .unwrap();
        assert_eq!(left.position, 11);
        assert_eq!(left.members, 2);
        assert!(!left.kind.is_horizontal());
        assert!(lines.iter().all(|l| l.members >= 2));
    }
}
