use nalgebra::Point2;

use crate::error::InvalidDetection;

/// Axis-aligned bounding box in TLBR format.
///
/// Coordinates are normalized to the frame: `(0, 0)` is the top-left corner and
/// `(1, 1)` the bottom-right one. Values slightly outside that range are allowed,
/// detectors routinely emit boxes clipped a few pixels past the border.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x1: f64,
    /// Top-left y coordinate
    pub y1: f64,
    /// Bottom-right x coordinate
    pub x2: f64,
    /// Bottom-right y coordinate
    pub y2: f64,
}

impl Rect {
    /// Create a new Rect from TLBR coordinates.
    #[inline]
    pub fn from_tlbr(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a Rect from its center and dimensions.
    #[inline]
    pub fn from_xywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x1: cx - width / 2.0,
            y1: cy - height / 2.0,
            x2: cx + width / 2.0,
            y2: cy + height / 2.0,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check that every coordinate is finite and the corners are ordered.
    ///
    /// Zero-width or zero-height boxes are accepted: their centroid is still a
    /// usable position even though their IoU with anything is zero.
    pub fn validate(&self) -> Result<(), InvalidDetection> {
        if !self.to_tlbr().iter().all(|v| v.is_finite()) {
            return Err(InvalidDetection::NonFiniteBox);
        }
        if self.x2 < self.x1 || self.y2 < self.y1 {
            return Err(InvalidDetection::InvertedBox {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
            });
        }
        Ok(())
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Rect) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }

    /// Translate the box so that its center lands on `center`.
    pub fn recentered(&self, center: Point2<f64>) -> Rect {
        Rect::from_xywh(center.x, center.y, self.width(), self.height())
    }
}
