//! Error types for the batch annotation pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while processing a batch of media files
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Pipeline closed: {0}")]
    PipelineClosed(String),

    #[error("Detection failed: {0}")]
    DetectionFailure(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn source<S: Into<String>>(msg: S) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::SinkUnavailable(msg.into())
    }

    pub fn closed<S: Into<String>>(msg: S) -> Self {
        Self::PipelineClosed(msg.into())
    }

    pub fn detection<S: Into<String>>(msg: S) -> Self {
        Self::DetectionFailure(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    /// A fatal error aborts the whole run; everything else is scoped to
    /// the media job it occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigInvalid(_))
    }
}
