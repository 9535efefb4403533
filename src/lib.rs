//! Batch People Detection Pipeline
//!
//! Processes directories of media files through an object-detection
//! capability, overlays detections and running statistics onto each frame,
//! writes annotated output, and persists a per-file statistics report.
//! Disk writes go through a bounded producer/consumer pipeline so frame
//! compute never stalls on I/O; per-file failures are isolated so one bad
//! file does not abort a run.

pub mod annotate;
pub mod config;
pub mod detector;
pub mod error;
pub mod processor;
pub mod source;
pub mod stats;
pub mod types;
pub mod writer;

pub use config::{AppConfig, MediaDirConfig, ModelConfig, WriterConfig};
pub use detector::{Detector, StubDetector};
pub use error::{PipelineError, Result};
pub use processor::{BatchOrchestrator, MediaKind};
pub use stats::StatisticsTracker;
pub use types::{Detection, FrameSnapshot, MediaJobResult, PixelBox, RunSummary};
pub use writer::{FrameSink, WriteJob, WriterPipeline};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
