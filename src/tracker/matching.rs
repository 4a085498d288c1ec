//! Detection input and track/detection association.

use log::warn;
use nalgebra::{Point2, distance};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::InvalidDetection;
use crate::tracker::category::Category;
use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in normalized TLBR format (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Category, already mapped from the detector's raw class
    pub category: Category,
    /// Detection confidence score
    pub confidence: f32,
    /// Frame this detection was produced for
    pub frame_index: u64,
}

impl Detection {
    pub fn new(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        category: Category,
        confidence: f32,
        frame_index: u64,
    ) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            category,
            confidence,
            frame_index,
        }
    }

    pub fn from_rect(bbox: Rect, category: Category, confidence: f32, frame_index: u64) -> Self {
        Self {
            bbox,
            category,
            confidence,
            frame_index,
        }
    }

    #[inline]
    pub fn centroid(&self) -> Point2<f64> {
        self.bbox.center()
    }

    pub fn validate(&self) -> Result<(), InvalidDetection> {
        self.bbox.validate()?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(InvalidDetection::Confidence(self.confidence));
        }
        Ok(())
    }
}

/// Where a live track is expected to appear in the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub centroid: Point2<f64>,
    pub bbox: Rect,
}

/// How the tracker resolves the track/detection cost matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStrategy {
    /// Repeatedly take the globally cheapest admissible pair.
    ///
    /// Ties are broken by ascending track (row) index, then ascending detection
    /// (column) index. This can differ from the optimum when trajectories cross.
    #[default]
    Greedy,
    /// Minimum total cost bipartite matching (Jonker-Volgenant).
    Optimal,
}

/// Compute the association cost between every prediction and detection.
///
/// The cost is the centroid distance, blended with `1 - IoU` scaled to the gate
/// so both terms share units: `(1 - w) * d + w * (1 - iou) * gate`.
pub fn cost_matrix(
    predictions: &[Prediction],
    detections: &[Detection],
    iou_weight: f64,
    gate: f64,
) -> Array2<f64> {
    let mut costs = Array2::zeros((predictions.len(), detections.len()));
    for (i, p) in predictions.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            let dist = distance(&p.centroid, &d.centroid());
            costs[[i, j]] = if iou_weight > 0.0 {
                (1.0 - iou_weight) * dist + iou_weight * (1.0 - p.bbox.iou(&d.bbox)) * gate
            } else {
                dist
            };
        }
    }
    costs
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn from_matches(matches: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        let mut row_used = vec![false; num_rows];
        let mut col_used = vec![false; num_cols];
        for &(r, c) in &matches {
            row_used[r] = true;
            col_used[c] = true;
        }
        Self {
            matches,
            unmatched_tracks: (0..num_rows).filter(|&r| !row_used[r]).collect(),
            unmatched_detections: (0..num_cols).filter(|&c| !col_used[c]).collect(),
        }
    }
}

/// Resolve `cost_matrix` with the chosen strategy. Pairs costing more than
/// `gate` are never matched.
pub fn assign(cost_matrix: &Array2<f64>, gate: f64, strategy: AssignmentStrategy) -> AssignmentResult {
    match strategy {
        AssignmentStrategy::Greedy => greedy_assignment(cost_matrix, gate),
        AssignmentStrategy::Optimal => {
            optimal_assignment(cost_matrix, gate).unwrap_or_else(|| {
                warn!("optimal assignment solver failed, falling back to greedy matching");
                greedy_assignment(cost_matrix, gate)
            })
        }
    }
}

pub fn greedy_assignment(cost_matrix: &Array2<f64>, gate: f64) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let mut candidates: Vec<(f64, usize, usize)> = cost_matrix
        .indexed_iter()
        .filter(|&(_, &c)| c.is_finite() && c <= gate)
        .map(|((r, c), &cost)| (cost, r, c))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut row_used = vec![false; num_rows];
    let mut col_used = vec![false; num_cols];
    let mut matches = Vec::new();
    for (_, r, c) in candidates {
        if row_used[r] || col_used[c] {
            continue;
        }
        row_used[r] = true;
        col_used[c] = true;
        matches.push((r, c));
    }
    matches.sort_unstable();

    AssignmentResult::from_matches(matches, num_rows, num_cols)
}

/// Cost given to padding cells and inadmissible pairs.
const INADMISSIBLE: f64 = 1e6;

/// Returns `None` if the solver fails.
pub fn optimal_assignment(cost_matrix: &Array2<f64>, gate: f64) -> Option<AssignmentResult> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Some(AssignmentResult::from_matches(vec![], num_rows, num_cols));
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), INADMISSIBLE);
    for ((r, c), &cost) in cost_matrix.indexed_iter() {
        if cost.is_finite() && cost <= gate {
            padded[[r, c]] = cost;
        }
    }

    let (row_to_col, _) = lapjv::lapjv(&padded).ok()?;
    let matches = row_to_col
        .iter()
        .enumerate()
        .filter(|&(r, &c)| r < num_rows && c < num_cols)
        .filter(|&(r, &c)| {
            let cost = cost_matrix[[r, c]];
            cost.is_finite() && cost <= gate
        })
        .map(|(r, &c)| (r, c))
        .collect();

    Some(AssignmentResult::from_matches(matches, num_rows, num_cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let det = Detection::new(0.1, 0.1, 0.2, 0.2, Category::Car, 1.5, 1);
        assert_eq!(det.validate(), Err(InvalidDetection::Confidence(1.5)));
        let det = Detection::new(0.1, 0.1, 0.2, 0.2, Category::Car, f32::NAN, 1);
        assert!(det.validate().is_err());
    }

    #[test]
    fn test_cost_matrix_is_centroid_distance() {
        let predictions = [Prediction {
            centroid: Point2::new(0.0, 0.0),
            bbox: Rect::from_xywh(0.0, 0.0, 0.1, 0.1),
        }];
        let detections = [Detection::from_rect(
            Rect::from_xywh(0.3, 0.4, 0.1, 0.1),
            Category::Car,
            0.9,
            1,
        )];
        let costs = cost_matrix(&predictions, &detections, 0.0, 1.0);
        assert!((costs[[0, 0]] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cost_matrix_iou_blend() {
        let bbox = Rect::from_xywh(0.5, 0.5, 0.2, 0.2);
        let predictions = [Prediction {
            centroid: bbox.center(),
            bbox,
        }];
        let detections = [Detection::from_rect(bbox, Category::Car, 0.9, 1)];
        // Identical boxes: zero distance and full overlap.
        let costs = cost_matrix(&predictions, &detections, 0.5, 0.1);
        assert!(costs[[0, 0]].abs() < 1e-9);
    }

    #[test]
    fn test_greedy_picks_cheapest_first() {
        let costs = array![[0.2, 0.1], [0.05, 0.3]];
        let result = greedy_assignment(&costs, 1.0);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_greedy_respects_gate() {
        let costs = array![[0.5], [0.05]];
        let result = greedy_assignment(&costs, 0.1);
        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_tracks, vec![0]);
    }

    #[test]
    fn test_greedy_tie_break_by_row_then_column() {
        let costs = array![[0.1, 0.1], [0.1, 0.1]];
        let result = greedy_assignment(&costs, 1.0);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_greedy_differs_from_optimal_on_crossing() {
        // Greedy grabs (0, 0) at 0.1 and is left with (1, 1) at 0.9 (total 1.0);
        // the optimum is (0, 1) + (1, 0) at 0.2 + 0.2.
        let costs = array![[0.1, 0.2], [0.2, 0.9]];
        let greedy = greedy_assignment(&costs, 1.0);
        assert_eq!(greedy.matches, vec![(0, 0), (1, 1)]);

        let optimal = optimal_assignment(&costs, 1.0).unwrap();
        assert_eq!(optimal.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_optimal_rectangular_and_gated() {
        let costs = array![[0.05, 0.5, 0.5]];
        let result = optimal_assignment(&costs, 0.1).unwrap();
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_detections, vec![1, 2]);

        let costs = array![[0.5], [0.6]];
        let result = optimal_assignment(&costs, 0.1).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_empty_matrices() {
        let costs = Array2::<f64>::zeros((0, 3));
        let result = assign(&costs, 1.0, AssignmentStrategy::Greedy);
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);

        let costs = Array2::<f64>::zeros((2, 0));
        let result = assign(&costs, 1.0, AssignmentStrategy::Optimal);
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
    }
}
