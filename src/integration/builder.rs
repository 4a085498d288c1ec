//! Builder for creating Detection objects from raw detector output.

use crate::error::InvalidDetection;
use crate::tracker::{Category, Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
///
/// Boxes may be given in pixels together with the frame size, and classes as
/// raw COCO names; `build` normalizes both and validates the result.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    frame_size: Option<(f64, f64)>,
    category: Option<Category>,
    class_name: Option<String>,
    confidence: f32,
    frame_index: u64,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f64, t: f64, w: f64, h: f64) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Treat the box as pixel coordinates in a frame of this size.
    pub fn pixels(mut self, width: f64, height: f64) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self.class_name = None;
        self
    }

    /// Set the detector's raw class name, mapped with `Category::from_coco_name`.
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self.category = None;
        self
    }

    /// Set the confidence score.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn frame(mut self, frame_index: u64) -> Self {
        self.frame_index = frame_index;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Result<Detection, InvalidDetection> {
        let category = match (self.category, self.class_name) {
            (Some(category), _) => category,
            (None, Some(name)) => {
                Category::from_coco_name(&name).ok_or(InvalidDetection::UnknownClass(name))?
            }
            (None, None) => return Err(InvalidDetection::UnknownClass(String::new())),
        };

        let bbox = match self.frame_size {
            Some((w, h)) if w > 0.0 && h > 0.0 => {
                Rect::from_tlbr(self.x1 / w, self.y1 / h, self.x2 / w, self.y2 / h)
            }
            Some(_) => return Err(InvalidDetection::NonFiniteBox),
            None => Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
        };

        let detection = Detection::from_rect(bbox, category, self.confidence, self.frame_index);
        detection.validate()?;
        Ok(detection)
    }
}
