#![forbid(unsafe_code)]

//! Frame-rate probe.
//!
//! Collects frame gaps over a sampling window and summarizes them as
//! average / min / max fps, dropped frames, and a coarse rating. Intended
//! for diagnostics screens and performance tests, not for control.

use std::time::Duration;

use crate::monitor::{DEFAULT_DROP_THRESHOLD, FrameSample};

/// Coarse rating of an average frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceRating {
    /// Below 30 fps.
    Poor,
    /// 30 to 45 fps.
    Fair,
    /// 45 to 55 fps.
    Good,
    /// 55 fps and above.
    Excellent,
}

impl PerformanceRating {
    /// Rate an average frame rate.
    pub fn from_fps(fps: f64) -> Self {
        if fps < 30.0 {
            Self::Poor
        } else if fps < 45.0 {
            Self::Fair
        } else if fps < 55.0 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

/// Summary of a sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateReport {
    /// Frames over total time.
    pub average_fps: f64,
    /// Rate implied by the longest gap.
    pub min_fps: f64,
    /// Rate implied by the shortest gap.
    pub max_fps: f64,
    /// Gaps above the drop threshold.
    pub dropped_frames: u32,
    /// Gaps recorded.
    pub frames: u32,
    /// Sum of all gaps.
    pub total: Duration,
    /// Rating of `average_fps`.
    pub rating: PerformanceRating,
}

/// Accumulates frame gaps.
#[derive(Debug, Clone)]
pub struct FrameRateProbe {
    drop_threshold: Duration,
    deltas: Vec<Duration>,
}

impl FrameRateProbe {
    /// Probe counting gaps above `drop_threshold` as drops.
    pub fn new(drop_threshold: Duration) -> Self {
        Self {
            drop_threshold,
            deltas: Vec::new(),
        }
    }

    /// Record one gap.
    pub fn record(&mut self, delta: Duration) {
        self.deltas.push(delta);
    }

    /// Record a monitor sample.
    pub fn record_sample(&mut self, sample: &FrameSample) {
        self.record(sample.delta);
    }

    /// Gaps recorded so far.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Forget all recorded gaps.
    pub fn clear(&mut self) {
        self.deltas.clear();
    }

    /// Summarize. `None` when nothing was recorded or all gaps are zero.
    pub fn report(&self) -> Option<FrameRateReport> {
        let frames = u32::try_from(self.deltas.len()).unwrap_or(u32::MAX);
        let total: Duration = self.deltas.iter().sum();
        if frames == 0 || total.is_zero() {
            return None;
        }
        let longest = self.deltas.iter().max()?;
        let shortest = self.deltas.iter().min()?;
        let fps = |d: Duration| {
            let secs = d.as_secs_f64();
            if secs > 0.0 { 1.0 / secs } else { f64::INFINITY }
        };
        let average_fps = f64::from(frames) / total.as_secs_f64();
        let dropped_frames = u32::try_from(
            self.deltas
                .iter()
                .filter(|d| **d > self.drop_threshold)
                .count(),
        )
        .unwrap_or(u32::MAX);
        Some(FrameRateReport {
            average_fps,
            min_fps: fps(*longest),
            max_fps: fps(*shortest),
            dropped_frames,
            frames,
            total,
            rating: PerformanceRating::from_fps(average_fps),
        })
    }
}

impl Default for FrameRateProbe {
    fn default() -> Self {
        Self::new(DEFAULT_DROP_THRESHOLD)
    }
}
