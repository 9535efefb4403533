//! Per-file media jobs and the batch orchestrator
//!
//! A job owns its source, tracker, and write pipeline outright; nothing is
//! shared across jobs, so one bad file never takes the batch down with it.

use crate::annotate::annotate_frame;
use crate::config::{MediaDirConfig, WriterConfig};
use crate::detector::Detector;
use crate::error::{PipelineError, Result};
use crate::source::{FrameSource, ImageFileSource};
use crate::stats::StatisticsTracker;
use crate::types::{MediaJobResult, RunSummary};
use crate::writer::{FrameSequenceSink, FrameSink, WriteJob, WriterPipeline};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Which kind of media a batch run handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    fn media_subdir(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Image => "images",
        }
    }
}

/// Per-file unit of work for a video stream: open, stream frames through
/// detect/update/annotate/submit, then finalize.
pub struct VideoJob {
    pub input_path: PathBuf,
    pub source: Box<dyn FrameSource>,
    pub sink: Box<dyn FrameSink>,
    pub write_job: WriteJob,
    pub queue_capacity: usize,
    pub stats_path: PathBuf,
}

impl VideoJob {
    pub fn run(mut self, detector: &mut dyn Detector) -> Result<MediaJobResult> {
        let mut pipeline =
            WriterPipeline::open(&self.write_job, self.sink, self.queue_capacity)?;
        let mut stats = StatisticsTracker::new();
        let total_hint = self.source.frame_count();

        let streamed = stream_frames(
            detector,
            self.source.as_mut(),
            &mut pipeline,
            &mut stats,
            (self.write_job.width, self.write_job.height),
            total_hint,
        );

        // Finalizing: already-accepted frames are flushed even when the
        // stream loop failed mid-way; partial output stays on disk.
        let closed = pipeline.close();
        match (streamed, closed) {
            (Ok(()), Ok(_written)) => {}
            // A dead pipeline during streaming means the worker hit the
            // root cause; prefer its stored error over the send failure.
            (Err(PipelineError::PipelineClosed(_)), Err(close_err)) => return Err(close_err),
            (Err(e), _) => return Err(e),
            (Ok(()), Err(e)) => return Err(e),
        }

        let name = file_stem(&self.input_path);
        stats.save(
            &self.stats_path,
            &name,
            self.write_job.width,
            self.write_job.height,
        )?;
        stats.log_summary();

        Ok(MediaJobResult {
            input_path: self.input_path,
            output_media_path: self.write_job.output_path,
            output_stats_path: self.stats_path,
            frames: stats.frame_count(),
            total_people: stats.total_people(),
            max_people: stats.max_people(),
        })
    }
}

fn stream_frames(
    detector: &mut dyn Detector,
    source: &mut dyn FrameSource,
    pipeline: &mut WriterPipeline,
    stats: &mut StatisticsTracker,
    target: (u32, u32),
    total_hint: Option<u64>,
) -> Result<()> {
    while let Some(frame) = source.read_frame()? {
        let resized = resize_to_target(&frame, target.0, target.1);
        let detections = detector.detect(&resized)?;
        let people = detections.len() as u32;
        stats.update(people);

        let annotated = annotate_frame(
            &resized,
            &detections,
            people,
            stats.max_people(),
            stats.elapsed(),
        );
        pipeline.submit(annotated)?;

        if stats.frame_count() % 100 == 0 {
            match total_hint {
                Some(total) if total > 0 => log::info!(
                    "Progress: {:.1}% ({}/{} frames)",
                    stats.frame_count() as f64 / total as f64 * 100.0,
                    stats.frame_count(),
                    total
                ),
                _ => log::info!("Processed {} frames", stats.frame_count()),
            }
        }
    }
    Ok(())
}

fn resize_to_target(frame: &RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.width() == width && frame.height() == height {
        frame.clone()
    } else {
        imageops::resize(frame, width, height, FilterType::Triangle)
    }
}

/// Open a video source, build the write path, and run the job
pub fn process_video(
    detector: &mut dyn Detector,
    media: &MediaDirConfig,
    writer: &WriterConfig,
    input_path: &Path,
) -> Result<MediaJobResult> {
    let source = open_video_source(input_path)?;
    let stem = file_stem(input_path);

    let write_job = WriteJob {
        output_path: media.output_directory.join("videos").join(format!(
            "result_{}_annotated.{}",
            stem, writer.output_extension
        )),
        fps: source.fps(),
        width: media.width,
        height: media.height,
        codec: writer.codec.clone(),
    };
    let sink = open_video_sink(&write_job)?;
    let stats_path = media
        .output_directory
        .join("stats")
        .join(format!("stats_{}.txt", stem));

    VideoJob {
        input_path: input_path.to_path_buf(),
        source,
        sink,
        write_job,
        queue_capacity: writer.queue_capacity,
        stats_path,
    }
    .run(detector)
}

#[cfg(feature = "opencv")]
fn open_video_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(crate::source::VideoFileSource::open(path)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    Err(PipelineError::source(format!(
        "video decode requires the opencv feature: {}",
        path.display()
    )))
}

#[cfg(feature = "opencv")]
fn open_video_sink(job: &WriteJob) -> Result<Box<dyn FrameSink>> {
    Ok(Box::new(crate::writer::VideoWriterSink::create(job)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video_sink(job: &WriteJob) -> Result<Box<dyn FrameSink>> {
    Ok(Box::new(FrameSequenceSink::create(job)?))
}

/// Per-file unit of work for a still image. A single frame has nothing to
/// decouple, so the annotated result is written synchronously.
pub fn process_image(
    detector: &mut dyn Detector,
    media: &MediaDirConfig,
    input_path: &Path,
) -> Result<MediaJobResult> {
    let mut source = ImageFileSource::open(input_path)?;
    let frame = source
        .read_frame()?
        .ok_or_else(|| PipelineError::source(format!("empty image: {}", input_path.display())))?;

    let resized = resize_to_target(&frame, media.width, media.height);
    let detections = detector.detect(&resized)?;
    let people = detections.len() as u32;

    let mut stats = StatisticsTracker::new();
    stats.update(people);
    let annotated = annotate_frame(
        &resized,
        &detections,
        people,
        stats.max_people(),
        stats.elapsed(),
    );

    let stem = file_stem(input_path);
    let output_image_path = media
        .output_directory
        .join("images")
        .join(format!("result_{}_annotated.jpg", stem));
    let stats_path = media
        .output_directory
        .join("stats")
        .join(format!("stats_{}.txt", stem));

    if let Some(parent) = output_image_path.parent() {
        fs::create_dir_all(parent)?;
    }
    annotated.save(&output_image_path).map_err(|e| {
        PipelineError::sink(format!("cannot write {}: {}", output_image_path.display(), e))
    })?;
    stats.save(&stats_path, &stem, media.width, media.height)?;

    Ok(MediaJobResult {
        input_path: input_path.to_path_buf(),
        output_media_path: output_image_path,
        output_stats_path: stats_path,
        frames: stats.frame_count(),
        total_people: stats.total_people(),
        max_people: stats.max_people(),
    })
}

/// Runs one media job per enumerated input file. A failed job is recorded
/// and the batch moves on; only configuration problems abort a run.
pub struct BatchOrchestrator {
    kind: MediaKind,
    media: MediaDirConfig,
    writer: WriterConfig,
}

impl BatchOrchestrator {
    pub fn new(kind: MediaKind, media: MediaDirConfig, writer: WriterConfig) -> Self {
        Self {
            kind,
            media,
            writer,
        }
    }

    pub fn run(&self, detector: &mut dyn Detector) -> Result<RunSummary> {
        fs::create_dir_all(self.media.output_directory.join(self.kind.media_subdir()))?;
        fs::create_dir_all(self.media.output_directory.join("stats"))?;

        let files = list_media_files(&self.media.input_directory, &self.media.extensions)?;
        if files.is_empty() {
            log::warn!(
                "No input files found in {}",
                self.media.input_directory.display()
            );
            return Ok(RunSummary::default());
        }
        log::info!(
            "{} file(s) found in {} ({})",
            files.len(),
            self.media.input_directory.display(),
            detector.name()
        );

        let mut summary = RunSummary::default();
        for (i, path) in files.iter().enumerate() {
            let name = file_name(path);
            log::info!("[{}/{}] Processing {}", i + 1, files.len(), name);

            let outcome = match self.kind {
                MediaKind::Video => process_video(detector, &self.media, &self.writer, path),
                MediaKind::Image => process_image(detector, &self.media, path),
            };
            match outcome {
                Ok(result) => {
                    log::info!("Finished {}", name);
                    summary.succeeded.push(result);
                }
                Err(e) => {
                    log::error!("Failed {}: {}", name, e);
                    summary.failed.push((name, e.to_string()));
                }
            }
        }

        log_run_summary(&summary);
        Ok(summary)
    }
}

/// Non-recursive listing of the input directory against the extension
/// allow-list, lexically sorted for a stable processing order. A missing
/// input directory is created and yields an empty batch.
fn list_media_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = file_name(&path).to_lowercase();
        if extensions.iter().any(|ext| name.ends_with(&ext.to_lowercase())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_run_summary(summary: &RunSummary) {
    log::info!(
        "Run complete: {} succeeded, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    for result in &summary.succeeded {
        log::info!("  ok: {}", file_name(&result.input_path));
    }
    for (name, cause) in &summary.failed {
        log::warn!("  failed: {} ({})", name, cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StubDetector;
    use crate::source::SyntheticSource;
    use crate::types::{Detection, PixelBox};
    use image::Rgb;

    fn media_config(root: &Path, extensions: &[&str]) -> MediaDirConfig {
        MediaDirConfig {
            input_directory: root.join("input"),
            output_directory: root.join("output"),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            width: 64,
            height: 48,
        }
    }

    fn synthetic_video_job(root: &Path, frames: u64) -> VideoJob {
        let write_job = WriteJob {
            output_path: root.join("videos").join("result_clip_annotated.mp4"),
            fps: 25.0,
            width: 64,
            height: 48,
            codec: "mp4v".to_string(),
        };
        let sink = FrameSequenceSink::create(&write_job).unwrap();
        VideoJob {
            input_path: PathBuf::from("clip.mp4"),
            source: Box::new(SyntheticSource::new(frames, 64, 48, 25.0)),
            sink: Box::new(sink),
            write_job,
            queue_capacity: 4,
            stats_path: root.join("stats").join("stats_clip.txt"),
        }
    }

    #[test]
    fn test_video_job_zero_detections() {
        let dir = tempfile::tempdir().unwrap();
        let job = synthetic_video_job(dir.path(), 5);
        let mut detector = StubDetector::empty();

        let result = job.run(&mut detector).unwrap();
        assert_eq!(result.frames, 5);
        assert_eq!(result.total_people, 0);
        assert_eq!(result.max_people, 0);

        let report = fs::read_to_string(&result.output_stats_path).unwrap();
        assert!(report.contains("Total frames: 5"));
        assert!(report.contains("Total people detected: 0"));
        assert!(report.contains("Max people in a frame: 0"));
        assert!(report.contains("Average people per frame: 0.00"));

        // One annotated frame on disk per source frame
        let seq_dir = result.output_media_path.with_extension("");
        for i in 1..=5 {
            assert!(seq_dir.join(format!("frame_{:06}.jpg", i)).exists());
        }
    }

    #[test]
    fn test_video_job_aggregates_detections() {
        let dir = tempfile::tempdir().unwrap();
        let job = synthetic_video_job(dir.path(), 3);
        let person = |x: i32| Detection::new(PixelBox::new(x, 10, x + 12, 40), 0.9, 0);
        let mut detector = StubDetector::with_script(vec![
            vec![person(2), person(20)],
            vec![],
            vec![person(5), person(22), person(40)],
        ]);

        let result = job.run(&mut detector).unwrap();
        assert_eq!(result.frames, 3);
        assert_eq!(result.total_people, 5);
        assert_eq!(result.max_people, 3);

        let report = fs::read_to_string(&result.output_stats_path).unwrap();
        assert!(report.contains("Total people detected: 5"));
        assert!(report.contains("Max people in a frame: 3"));
    }

    #[test]
    fn test_image_batch_isolates_middle_failure() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_config(dir.path(), &[".jpg", ".png"]);
        fs::create_dir_all(&media.input_directory).unwrap();

        image::RgbImage::from_pixel(32, 32, Rgb([40, 40, 40]))
            .save(media.input_directory.join("a.png"))
            .unwrap();
        // Valid extension, garbage payload: this one must fail to open
        fs::write(media.input_directory.join("b.jpg"), b"not an image").unwrap();
        image::RgbImage::from_pixel(32, 32, Rgb([80, 80, 80]))
            .save(media.input_directory.join("c.png"))
            .unwrap();

        let orchestrator =
            BatchOrchestrator::new(MediaKind::Image, media.clone(), WriterConfig::default());
        let mut detector = StubDetector::empty();
        let summary = orchestrator.run(&mut detector).unwrap();

        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "b.jpg");
        assert!(!summary.is_clean());

        // Files 1 and 3 were fully processed with their own outputs
        let out = &media.output_directory;
        assert!(out.join("images/result_a_annotated.jpg").exists());
        assert!(out.join("images/result_c_annotated.jpg").exists());
        assert!(out.join("stats/stats_a.txt").exists());
        assert!(out.join("stats/stats_c.txt").exists());
        assert!(!out.join("images/result_b_annotated.jpg").exists());
    }

    #[test]
    fn test_missing_input_dir_yields_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_config(dir.path(), &[".jpg"]);
        let orchestrator =
            BatchOrchestrator::new(MediaKind::Image, media.clone(), WriterConfig::default());

        let summary = orchestrator.run(&mut StubDetector::empty()).unwrap();
        assert_eq!(summary.total(), 0);
        // The input directory is created for the operator
        assert!(media.input_directory.exists());
    }

    #[test]
    fn test_listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.MP4"), b"x").unwrap();
        fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let files =
            list_media_files(dir.path(), &[".mp4".to_string()]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.mp4", "b.MP4"]);
    }

    #[test]
    fn test_process_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_config(dir.path(), &[".jpg"]);
        let err = process_image(
            &mut StubDetector::empty(),
            &media,
            &media.input_directory.join("ghost.jpg"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    }

    #[test]
    fn test_image_job_resizes_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_config(dir.path(), &[".png"]);
        fs::create_dir_all(&media.input_directory).unwrap();
        let input = media.input_directory.join("wide.png");
        image::RgbImage::new(128, 128).save(&input).unwrap();

        let result = process_image(&mut StubDetector::empty(), &media, &input).unwrap();
        let written = image::open(&result.output_media_path).unwrap().to_rgb8();
        assert_eq!((written.width(), written.height()), (64, 48));
    }
}
