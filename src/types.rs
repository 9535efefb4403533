//! Core data types shared across the pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// COCO class names (80 classes). The detection capability reports class
/// ids into this table; person is class 0.
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train",
    "truck", "boat", "traffic light", "fire hydrant", "stop sign",
    "parking meter", "bench", "bird", "cat", "dog", "horse", "sheep", "cow",
    "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard",
    "sports ball", "kite", "baseball bat", "baseball glove", "skateboard",
    "surfboard", "tennis racket", "bottle", "wine glass", "cup", "fork",
    "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv",
    "laptop", "mouse", "remote", "keyboard", "cell phone", "microwave",
    "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase",
    "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Axis-aligned box in pixel space; x1 < x2 and y1 < y2 for a valid box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

/// One model output for a single frame. Produced by the detection
/// capability, consumed by annotation, then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in pixel coordinates of the resized frame
    pub bbox: PixelBox,
    /// Detection confidence score (0-1)
    pub confidence: f32,
    /// Class id into `COCO_CLASSES`
    pub class_id: u32,
}

impl Detection {
    pub fn new(bbox: PixelBox, confidence: f32, class_id: u32) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }

    pub fn class_name(&self) -> &'static str {
        COCO_CLASSES
            .get(self.class_id as usize)
            .copied()
            .unwrap_or("object")
    }
}

/// Per-frame statistics entry; appended once per processed frame and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    /// 1-based frame index
    pub frame: u64,
    pub people_count: u32,
    /// Running maximum as of this frame
    pub max_people: u32,
    pub elapsed_secs: f64,
}

/// Final record for one completed media job
#[derive(Debug, Clone)]
pub struct MediaJobResult {
    pub input_path: PathBuf,
    pub output_media_path: PathBuf,
    pub output_stats_path: PathBuf,
    pub frames: u64,
    pub total_people: u64,
    pub max_people: u32,
}

/// Outcome of one batch run: completed job results plus (file name, cause)
/// for every job that failed.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<MediaJobResult>,
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_lookup() {
        let det = Detection::new(PixelBox::new(0, 0, 10, 10), 0.9, 0);
        assert_eq!(det.class_name(), "person");

        let unknown = Detection::new(PixelBox::new(0, 0, 10, 10), 0.9, 999);
        assert_eq!(unknown.class_name(), "object");
    }

    #[test]
    fn test_pixel_box_dimensions() {
        let bbox = PixelBox::new(10, 20, 50, 80);
        assert_eq!(bbox.width(), 40);
        assert_eq!(bbox.height(), 60);
        assert!(bbox.is_valid());

        let degenerate = PixelBox::new(50, 20, 10, 80);
        assert_eq!(degenerate.width(), 0);
        assert!(!degenerate.is_valid());
    }
}
