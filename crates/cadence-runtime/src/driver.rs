#![forbid(unsafe_code)]

//! Per-frame glue between the render loop, the governor and the
//! orchestrator.
//!
//! The host calls [`FrameDriver::on_frame`] once per render-loop tick with
//! the tick's timestamp. The driver feeds the timestamp to the frame
//! monitor (which may move the performance level) and then advances every
//! animation by the time since the previous tick.

use std::time::{Duration, Instant};

use cadence_budget::LevelTransition;
use tracing::debug;

use crate::orchestrator::AnimationOrchestrator;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Time the animations advanced by.
    pub dt: Duration,
    /// Level change caused by this frame, if any.
    pub transition: Option<LevelTransition>,
    /// Animations that finished during this frame.
    pub finished: usize,
}

/// Drives an orchestrator from render-loop timestamps.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    orchestrator: AnimationOrchestrator,
    last_frame: Option<Instant>,
    frames: u64,
}

impl FrameDriver {
    /// Drive `orchestrator`.
    pub fn new(orchestrator: AnimationOrchestrator) -> Self {
        Self {
            orchestrator,
            last_frame: None,
            frames: 0,
        }
    }

    /// The driven orchestrator.
    pub fn orchestrator(&self) -> &AnimationOrchestrator {
        &self.orchestrator
    }

    /// Handle one render-loop tick at `now`.
    ///
    /// The first tick after construction or [`reset`](Self::reset) advances
    /// animations by zero (it only establishes the baseline).
    pub fn on_frame(&mut self, now: Instant) -> FrameReport {
        let transition = self.orchestrator.performance().on_frame(now);
        if let Some(t) = transition {
            debug!(
                frame = self.frames,
                to = t.to.as_str(),
                "frame report carries a level transition"
            );
        }
        let dt = self
            .last_frame
            .replace(now)
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.frames = self.frames.saturating_add(1);
        let finished = self.orchestrator.tick(dt);
        FrameReport {
            dt,
            transition,
            finished,
        }
    }

    /// Advance animations by `dt` without touching the frame monitor.
    pub fn tick(&mut self, dt: Duration) -> usize {
        self.orchestrator.tick(dt)
    }

    /// Forget the previous timestamp, e.g. after the host was suspended.
    pub fn reset(&mut self) {
        self.last_frame = None;
    }

    /// Frames handled since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
