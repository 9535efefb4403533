//! Application configuration: JSON file loading plus fail-fast validation

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Detection capability settings, passed through to whichever model
/// runtime is wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to model weights
    pub weights: String,
    /// Confidence threshold for detections (0-1)
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression (0-1)
    pub iou_threshold: f32,
    /// Class ids to keep; person is 0
    pub classes: Vec<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: "models/yolo11n.pt".to_string(),
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            classes: vec![0],
        }
    }
}

/// Input/output directories and target dimensions for one media kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDirConfig {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    /// Extension allow-list, lowercase with leading dot
    pub extensions: Vec<String>,
    /// Target frame width after resize
    pub width: u32,
    /// Target frame height after resize
    pub height: u32,
}

impl MediaDirConfig {
    fn video_default() -> Self {
        Self {
            input_directory: PathBuf::from("input/videos"),
            output_directory: PathBuf::from("output"),
            extensions: [".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            width: 1280,
            height: 720,
        }
    }

    fn image_default() -> Self {
        Self {
            input_directory: PathBuf::from("input/images"),
            output_directory: PathBuf::from("output"),
            extensions: [".jpg", ".jpeg", ".png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            width: 1280,
            height: 720,
        }
    }
}

/// Write-path settings shared by all video jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Bounded queue capacity between the frame loop and the writer worker
    pub queue_capacity: usize,
    /// FourCC codec identifier for the video sink
    pub codec: String,
    /// Extension of the annotated output file
    pub output_extension: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 30,
            codec: "mp4v".to_string(),
            output_extension: "mp4".to_string(),
        }
    }
}

/// Top-level configuration, loaded once before any file is touched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub video: MediaDirConfig,
    pub image: MediaDirConfig,
    pub writer: WriterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            video: MediaDirConfig::video_default(),
            image: MediaDirConfig::image_default(),
            writer: WriterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a JSON file. Any problem is
    /// `ConfigInvalid` and fatal to the run.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::config(format!("invalid JSON in {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check required settings before any job runs
    pub fn validate(&self) -> Result<()> {
        if self.model.weights.is_empty() {
            return Err(PipelineError::config("model.weights is empty"));
        }
        for (name, value) in [
            ("model.confidence_threshold", self.model.confidence_threshold),
            ("model.iou_threshold", self.model.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, media) in [("video", &self.video), ("image", &self.image)] {
            if media.width == 0 || media.height == 0 {
                return Err(PipelineError::config(format!(
                    "{} dimensions must be positive, got {}x{}",
                    name, media.width, media.height
                )));
            }
            if media.extensions.is_empty() {
                return Err(PipelineError::config(format!(
                    "{} extension allow-list is empty",
                    name
                )));
            }
        }
        if self.writer.queue_capacity == 0 {
            return Err(PipelineError::config("writer.queue_capacity must be positive"));
        }
        if self.writer.codec.chars().count() != 4 {
            return Err(PipelineError::config(format!(
                "writer.codec must be a 4-character fourcc, got {:?}",
                self.writer.codec
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut config = AppConfig::default();
        config.model.confidence_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut config = AppConfig::default();
        config.video.width = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut config = AppConfig::default();
        config.writer.queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_invalid() {
        let err = AppConfig::load(Path::new("no/such/config.json")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigInvalid(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let raw = r#"{ "writer": { "queue_capacity": 8 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.writer.queue_capacity, 8);
        assert_eq!(config.writer.codec, "mp4v");
        assert_eq!(config.video.width, 1280);
        assert!(config.validate().is_ok());
    }
}
