//! Running statistics for one media job
//!
//! The tracker owns a per-frame history that grows with frame count and is
//! discarded with the tracker at job end; jobs are bounded in duration so
//! this stays an accepted trade-off rather than a leak.

use crate::error::Result;
use crate::types::FrameSnapshot;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Accumulates per-frame people counts into a running aggregate plus an
/// elapsed-time-stamped history.
pub struct StatisticsTracker {
    frame_count: u64,
    total_people: u64,
    max_people: u32,
    start: Instant,
    history: Vec<FrameSnapshot>,
}

impl StatisticsTracker {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            total_people: 0,
            max_people: 0,
            start: Instant::now(),
            history: Vec::new(),
        }
    }

    /// Record one processed frame. Caller contract: exactly once per frame,
    /// in frame order. No reordering or validation is performed.
    pub fn update(&mut self, people_count: u32) {
        self.frame_count += 1;
        self.total_people += u64::from(people_count);
        self.max_people = self.max_people.max(people_count);
        self.history.push(FrameSnapshot {
            frame: self.frame_count,
            people_count,
            max_people: self.max_people,
            elapsed_secs: self.elapsed(),
        });
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn total_people(&self) -> u64 {
        self.total_people
    }

    pub fn max_people(&self) -> u32 {
        self.max_people
    }

    pub fn history(&self) -> &[FrameSnapshot] {
        &self.history
    }

    /// Wall-clock seconds since tracker construction
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Mean people per frame; 0 before the first update
    pub fn average_people(&self) -> f64 {
        if self.frame_count == 0 {
            return 0.0;
        }
        self.total_people as f64 / self.frame_count as f64
    }

    /// Frames processed per elapsed second; 0 when no time has passed
    pub fn processing_fps(&self) -> f64 {
        let elapsed = self.elapsed();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.frame_count as f64 / elapsed
    }

    /// Render the fixed-format text report for the current aggregate.
    /// Pure with respect to tracker state; callable any number of times.
    pub fn render_report(&self, name: &str, width: u32, height: u32) -> String {
        let banner = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{}", banner);
        let _ = writeln!(out, "PEOPLE DETECTION STATISTICS");
        let _ = writeln!(out, "{}", banner);
        let _ = writeln!(out);
        let _ = writeln!(out, "Source: {}", name);
        let _ = writeln!(out, "Resolution: {}x{}", width, height);
        let _ = writeln!(out, "Total frames: {}", self.frame_count);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total processing time: {:.2}s", self.elapsed());
        let _ = writeln!(out, "Processing FPS: {:.2}", self.processing_fps());
        let _ = writeln!(out);
        let _ = writeln!(out, "Total people detected: {}", self.total_people);
        let _ = writeln!(out, "Max people in a frame: {}", self.max_people);
        let _ = writeln!(out, "Average people per frame: {:.2}", self.average_people());
        let _ = writeln!(out, "{}", banner);
        out
    }

    /// Write the report to disk, creating parent directories as needed
    pub fn save(&self, path: &Path, name: &str, width: u32, height: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render_report(name, width, height))?;
        log::info!("Statistics saved to {}", path.display());
        Ok(())
    }

    /// Emit the final aggregate through the logger
    pub fn log_summary(&self) {
        log::info!(
            "Processed {} frames in {:.2}s ({:.2} fps)",
            self.frame_count,
            self.elapsed(),
            self.processing_fps()
        );
        log::info!(
            "People: {} total, {} max in a frame, {:.2} average",
            self.total_people,
            self.max_people,
            self.average_people()
        );
    }
}

impl Default for StatisticsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_invariants() {
        let counts = [3u32, 0, 7, 2, 7, 1];
        let mut stats = StatisticsTracker::new();
        for &c in &counts {
            stats.update(c);
        }

        assert_eq!(stats.frame_count(), counts.len() as u64);
        assert_eq!(
            stats.total_people(),
            counts.iter().map(|&c| u64::from(c)).sum::<u64>()
        );
        assert_eq!(stats.max_people(), 7);
        assert!((stats.average_people() - 20.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_is_ordered_and_stamped() {
        let mut stats = StatisticsTracker::new();
        stats.update(2);
        stats.update(5);
        stats.update(1);

        let history = stats.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].frame, 1);
        assert_eq!(history[2].frame, 3);
        assert_eq!(history[1].people_count, 5);
        // Running max is carried forward, not recomputed per entry
        assert_eq!(history[2].max_people, 5);
        assert!(history[0].elapsed_secs <= history[2].elapsed_secs);
    }

    #[test]
    fn test_empty_tracker_has_defined_average() {
        let stats = StatisticsTracker::new();
        assert_eq!(stats.average_people(), 0.0);
        assert_eq!(stats.frame_count(), 0);
    }

    #[test]
    fn test_report_format() {
        let mut stats = StatisticsTracker::new();
        stats.update(4);
        stats.update(2);

        let report = stats.render_report("lobby.mp4", 1280, 720);
        assert!(report.starts_with(&"=".repeat(60)));
        assert!(report.contains("PEOPLE DETECTION STATISTICS"));
        assert!(report.contains("Source: lobby.mp4"));
        assert!(report.contains("Resolution: 1280x720"));
        assert!(report.contains("Total frames: 2"));
        assert!(report.contains("Total people detected: 6"));
        assert!(report.contains("Max people in a frame: 4"));
        assert!(report.contains("Average people per frame: 3.00"));
    }

    #[test]
    fn test_report_zero_frames() {
        let stats = StatisticsTracker::new();
        let report = stats.render_report("empty.mp4", 640, 480);
        assert!(report.contains("Total frames: 0"));
        assert!(report.contains("Total people detected: 0"));
        assert!(report.contains("Average people per frame: 0.00"));
    }
}
