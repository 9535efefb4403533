//! Bounded write path decoupling per-frame compute from sink I/O
//!
//! One dedicated worker per open pipeline drains a bounded queue to the
//! sink in submission order. A full queue blocks the submitter
//! (backpressure) instead of dropping frames; shutdown is a typed
//! end-of-stream message rather than a null sentinel.

use crate::error::{PipelineError, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use image::RgbImage;
use std::fs;
use std::path::PathBuf;
use std::thread;

/// Opaque encode boundary. The sink handle is owned exclusively by the
/// writer worker once a pipeline is open.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Release the underlying sink; called once after the last frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Immutable description of one output stream
#[derive(Debug, Clone)]
pub struct WriteJob {
    pub output_path: PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

enum WriterMessage {
    Frame(RgbImage),
    EndOfStream,
}

/// Single-producer/single-consumer write pipeline with a bounded queue
pub struct WriterPipeline {
    tx: Sender<WriterMessage>,
    worker: Option<thread::JoinHandle<Result<u64>>>,
    closed: bool,
}

impl WriterPipeline {
    /// Spawn the writer worker over a bounded queue of `capacity` frames.
    /// The sink must already be created; constructors fail with
    /// `SinkUnavailable` before a pipeline ever exists.
    pub fn open(job: &WriteJob, sink: Box<dyn FrameSink>, capacity: usize) -> Result<Self> {
        let (tx, rx) = bounded::<WriterMessage>(capacity.max(1));
        let output = job.output_path.clone();
        let worker = thread::spawn(move || Self::worker_loop(sink, rx, output));
        Ok(Self {
            tx,
            worker: Some(worker),
            closed: false,
        })
    }

    fn worker_loop(
        mut sink: Box<dyn FrameSink>,
        rx: Receiver<WriterMessage>,
        output: PathBuf,
    ) -> Result<u64> {
        log::debug!("Writer worker started for {}", output.display());
        let mut written = 0u64;
        loop {
            match rx.recv() {
                Ok(WriterMessage::Frame(frame)) => {
                    if let Err(e) = sink.write_frame(&frame) {
                        log::error!("Frame write failed for {}: {}", output.display(), e);
                        // Partial output stays on disk; release what we can
                        let _ = sink.finish();
                        return Err(e);
                    }
                    written += 1;
                }
                Ok(WriterMessage::EndOfStream) => break,
                // Producer dropped without close(); flush what we have
                Err(_) => break,
            }
        }
        sink.finish()?;
        log::debug!("Writer worker stopped after {} frames", written);
        Ok(written)
    }

    /// Enqueue one annotated frame. Blocks while the queue is at capacity;
    /// no frame is ever silently dropped.
    pub fn submit(&mut self, frame: RgbImage) -> Result<()> {
        if self.closed {
            return Err(PipelineError::closed("submit after close"));
        }
        self.tx
            .send(WriterMessage::Frame(frame))
            .map_err(|_| PipelineError::closed("writer worker is gone"))
    }

    /// Flush all queued frames, stop the worker, and release the sink.
    /// Returns the number of frames written, or the first write error the
    /// worker hit. Call at most once.
    pub fn close(&mut self) -> Result<u64> {
        if self.closed {
            return Err(PipelineError::closed("pipeline already closed"));
        }
        self.closed = true;
        // Send fails only when the worker already exited with an error;
        // the join below surfaces that error.
        let _ = self.tx.send(WriterMessage::EndOfStream);
        match self.worker.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(PipelineError::closed("writer worker panicked"))),
            None => Err(PipelineError::closed("writer worker already joined")),
        }
    }
}

impl Drop for WriterPipeline {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = self.tx.send(WriterMessage::EndOfStream);
            let _ = handle.join();
        }
    }
}

/// Default sink for builds without a video encoder: the annotated stream
/// is written as numbered frames under a directory derived from the job's
/// output path (extension stripped).
pub struct FrameSequenceSink {
    dir: PathBuf,
    next_index: u64,
}

impl FrameSequenceSink {
    pub fn create(job: &WriteJob) -> Result<Self> {
        let dir = job.output_path.with_extension("");
        fs::create_dir_all(&dir).map_err(|e| {
            PipelineError::sink(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir, next_index: 1 })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl FrameSink for FrameSequenceSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.dir.join(format!("frame_{:06}.jpg", self.next_index));
        frame
            .save(&path)
            .map_err(|e| PipelineError::sink(format!("cannot write {}: {}", path.display(), e)))?;
        self.next_index += 1;
        Ok(())
    }
}

/// Video sink backed by OpenCV's VideoWriter
#[cfg(feature = "opencv")]
pub struct VideoWriterSink {
    writer: opencv::videoio::VideoWriter,
}

#[cfg(feature = "opencv")]
impl VideoWriterSink {
    pub fn create(job: &WriteJob) -> Result<Self> {
        use opencv::core::Size;
        use opencv::videoio::{VideoWriter, VideoWriterTraitConst};

        let chars: Vec<char> = job.codec.chars().collect();
        if chars.len() != 4 {
            return Err(PipelineError::sink(format!(
                "codec must be a 4-character fourcc, got {:?}",
                job.codec
            )));
        }
        let fourcc = VideoWriter::fourcc(chars[0], chars[1], chars[2], chars[3])
            .map_err(|e| PipelineError::sink(format!("bad fourcc {:?}: {}", job.codec, e)))?;

        if let Some(parent) = job.output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = job.output_path.to_string_lossy().to_string();
        let writer = VideoWriter::new(
            &path,
            fourcc,
            job.fps,
            Size::new(job.width as i32, job.height as i32),
            true,
        )
        .map_err(|e| PipelineError::sink(format!("cannot create {}: {}", path, e)))?;

        if !writer
            .is_opened()
            .map_err(|e| PipelineError::sink(format!("writer check failed: {}", e)))?
        {
            return Err(PipelineError::sink(format!(
                "cannot open video writer for {}",
                path
            )));
        }
        Ok(Self { writer })
    }
}

#[cfg(feature = "opencv")]
impl FrameSink for VideoWriterSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        use opencv::core::{Mat, MatTraitConst};
        use opencv::videoio::VideoWriterTrait;

        // RGB -> BGR reorder into an owned Mat
        let mut data = frame.as_raw().clone();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let flat = Mat::from_slice(&data)
            .map_err(|e| PipelineError::sink(format!("frame conversion failed: {}", e)))?;
        let mat = flat
            .reshape(3, frame.height() as i32)
            .map_err(|e| PipelineError::sink(format!("frame reshape failed: {}", e)))?
            .try_clone()
            .map_err(|e| PipelineError::sink(format!("frame clone failed: {}", e)))?;
        self.writer
            .write(&mat)
            .map_err(|e| PipelineError::sink(format!("frame write failed: {}", e)))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        use opencv::videoio::VideoWriterTrait;
        self.writer
            .release()
            .map_err(|e| PipelineError::sink(format!("writer release failed: {}", e)))?;
        Ok(())
    }
}
