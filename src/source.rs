//! Frame acquisition boundary
//!
//! Decoding is opaque to the pipeline; jobs pull frames through the
//! `FrameSource` trait. Real video decode sits behind the `opencv`
//! feature, mirroring how the sinks are gated.

use crate::error::{PipelineError, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Common interface for frame producers
pub trait FrameSource: Send {
    /// Pull the next frame; `Ok(None)` signals end of stream
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Source frame rate hint, when known
    fn fps(&self) -> f64 {
        30.0
    }

    /// Total frame count hint, when known
    fn frame_count(&self) -> Option<u64> {
        None
    }
}

/// Single-frame source backed by a still image file
#[derive(Debug)]
pub struct ImageFileSource {
    frame: Option<RgbImage>,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| {
                PipelineError::source(format!("cannot open {}: {}", path.display(), e))
            })?
            .to_rgb8();
        Ok(Self { frame: Some(img) })
    }
}

impl FrameSource for ImageFileSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frame.take())
    }

    fn frame_count(&self) -> Option<u64> {
        Some(1)
    }
}

/// Generated source producing a fixed number of frames; used by tests and
/// by pipeline validation runs without real media.
pub struct SyntheticSource {
    produced: u64,
    total: u64,
    width: u32,
    height: u32,
    fps: f64,
}

impl SyntheticSource {
    pub fn new(total: u64, width: u32, height: u32, fps: f64) -> Self {
        Self {
            produced: 0,
            total,
            width,
            height,
            fps,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.produced >= self.total {
            return Ok(None);
        }
        let mut frame = RgbImage::new(self.width, self.height);
        // Stamp the frame index so consumers can tell frames apart
        frame.put_pixel(0, 0, Rgb([(self.produced & 0xff) as u8, 0, 0]));
        self.produced += 1;
        Ok(Some(frame))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }
}

/// Video source backed by OpenCV's VideoCapture
#[cfg(feature = "opencv")]
pub struct VideoFileSource {
    cap: opencv::videoio::VideoCapture,
    fps: f64,
    total: Option<u64>,
}

#[cfg(feature = "opencv")]
impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};

        let path_str = path.to_string_lossy().to_string();
        let cap = VideoCapture::from_file(&path_str, videoio::CAP_ANY)
            .map_err(|e| PipelineError::source(format!("cannot open {}: {}", path_str, e)))?;
        if !cap
            .is_opened()
            .map_err(|e| PipelineError::source(format!("capture check failed: {}", e)))?
        {
            return Err(PipelineError::source(format!(
                "video file is not opened: {}",
                path_str
            )));
        }

        let fps = cap.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        let fps = if fps > 0.0 { fps } else { 30.0 };
        let total = cap
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .ok()
            .filter(|&n| n > 0.0)
            .map(|n| n as u64);

        log::info!("Video file opened: {} ({:.1} fps)", path_str, fps);
        Ok(Self { cap, fps, total })
    }
}

#[cfg(feature = "opencv")]
impl FrameSource for VideoFileSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        use opencv::core::{Mat, MatTraitConst};
        use opencv::imgproc;
        use opencv::videoio::VideoCaptureTrait;

        let mut bgr = Mat::default();
        let ok = self
            .cap
            .read(&mut bgr)
            .map_err(|e| PipelineError::source(format!("frame read failed: {}", e)))?;
        if !ok || bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| PipelineError::source(format!("color conversion failed: {}", e)))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .map_err(|e| PipelineError::source(format!("frame access failed: {}", e)))?
            .to_vec();
        RgbImage::from_vec(width, height, data)
            .map(Some)
            .ok_or_else(|| PipelineError::source("failed to build frame buffer"))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_source_produces_exactly_n() {
        let mut source = SyntheticSource::new(3, 16, 16, 25.0);
        assert_eq!(source.frame_count(), Some(3));

        let mut frames = Vec::new();
        while let Some(frame) = source.read_frame().unwrap() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), 3);
        // Frames are distinguishable by their stamp
        assert_eq!(frames[0].get_pixel(0, 0)[0], 0);
        assert_eq!(frames[2].get_pixel(0, 0)[0], 2);
        // Drained source stays drained
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_image_source_missing_file() {
        let err = ImageFileSource::open(Path::new("no/such/photo.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    }

    #[test]
    fn test_image_source_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        RgbImage::new(12, 9).save(&path).unwrap();

        let mut source = ImageFileSource::open(&path).unwrap();
        let frame = source.read_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (12, 9));
        assert!(source.read_frame().unwrap().is_none());
    }
}
