//! Detection capability boundary
//!
//! The model runtime lives outside this crate; jobs only see the
//! `Detector` trait. `StubDetector` stands in where no runtime is wired,
//! so the full pipeline stays exercisable without model weights.

use crate::error::Result;
use crate::types::Detection;
use image::RgbImage;

/// Common interface for object detectors
pub trait Detector: Send {
    /// Detect people in a single frame. Called once per processed frame;
    /// latency here dominates per-frame cost.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;

    /// Detector name for logging
    fn name(&self) -> &str;
}

/// Scripted detector for pipeline validation without a model runtime.
/// Each call returns the next entry of the script; frames past the end of
/// the script come back empty.
pub struct StubDetector {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl StubDetector {
    /// Detector that never reports anything
    pub fn empty() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Detector for StubDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        let out = self.script.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        Ok(out)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelBox;

    #[test]
    fn test_stub_plays_script_then_empty() {
        let det = Detection::new(PixelBox::new(0, 0, 10, 10), 0.8, 0);
        let mut stub = StubDetector::with_script(vec![vec![det.clone(), det], vec![]]);
        let frame = RgbImage::new(4, 4);

        assert_eq!(stub.detect(&frame).unwrap().len(), 2);
        assert_eq!(stub.detect(&frame).unwrap().len(), 0);
        // Past the end of the script
        assert_eq!(stub.detect(&frame).unwrap().len(), 0);
    }
}
