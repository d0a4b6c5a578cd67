#![forbid(unsafe_code)]

//! Frame monitor.
//!
//! Turns render-loop tick timestamps into [`FrameSample`]s. A tick is a
//! drop when the gap since the previous tick exceeds the drop threshold.
//!
//! # Lifecycle
//!
//! ```text
//! Inactive --start()--> AwaitingSettle --interactions_settled()--> Monitoring
//!    ^                                                                 |
//!    +---------------------------- stop() ----------------------------+
//! ```
//!
//! Monitoring begins only once startup interactions have settled, so launch
//! jank is never counted. The first tick while monitoring only records a
//! baseline timestamp.
//!
//! # Failure Modes
//!
//! - Host without frame callbacks: `start()` logs and leaves the monitor
//!   inert; no samples are ever produced.
//! - Non-monotonic timestamps: the delta saturates to zero (never a drop).

use std::time::{Duration, Instant};

use cadence_core::host::{PlatformUnavailable, RenderLoop};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Default gap above which a tick counts as dropped (just under 50 fps).
pub const DEFAULT_DROP_THRESHOLD: Duration = Duration::from_millis(20);

/// Environment variable overriding the drop threshold, in milliseconds.
pub const ENV_DROP_THRESHOLD_MS: &str = "CADENCE_DROP_THRESHOLD_MS";

/// Frame monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Gaps strictly longer than this are drops.
    pub drop_threshold: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            drop_threshold: DEFAULT_DROP_THRESHOLD,
        }
    }
}

impl MonitorConfig {
    /// Defaults, overridden by `CADENCE_DROP_THRESHOLD_MS` when it parses.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(ENV_DROP_THRESHOLD_MS)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            config.drop_threshold = Duration::from_millis(ms);
        }
        config
    }

    /// Set the drop threshold (builder).
    #[must_use]
    pub fn drop_threshold(mut self, threshold: Duration) -> Self {
        self.drop_threshold = threshold;
        self
    }

    /// Whether a gap of `delta` is a dropped frame.
    #[inline]
    pub fn is_drop(&self, delta: Duration) -> bool {
        delta > self.drop_threshold
    }
}

/// One observed render-loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSample {
    /// When the tick happened.
    pub timestamp: Instant,
    /// Gap since the previous tick.
    pub delta: Duration,
    /// Whether the gap exceeded the drop threshold.
    pub dropped: bool,
}

/// Monitor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorState {
    /// Not registered with the render loop.
    Inactive,
    /// Registered; waiting for startup interactions to settle.
    AwaitingSettle,
    /// Producing samples.
    Monitoring,
}

impl MonitorState {
    /// Lowercase name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::AwaitingSettle => "awaiting_settle",
            Self::Monitoring => "monitoring",
        }
    }
}

/// Classifies render-loop ticks into frame samples.
#[derive(Debug, Clone)]
pub struct FrameMonitor {
    config: MonitorConfig,
    state: MonitorState,
    last_tick: Option<Instant>,
    inert: bool,
    frames: u64,
    drops: u64,
}

impl FrameMonitor {
    /// Create an inactive monitor.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: MonitorState::Inactive,
            last_tick: None,
            inert: false,
            frames: 0,
            drops: 0,
        }
    }

    /// Register with the render loop.
    ///
    /// Returns the absorbed error when the host has no frame callbacks; the
    /// monitor then stays inactive for good.
    pub fn start(&mut self, render: &dyn RenderLoop) -> Result<(), PlatformUnavailable> {
        if !render.supports_frame_callbacks() {
            self.inert = true;
            self.state = MonitorState::Inactive;
            let err = PlatformUnavailable::new("frame callbacks");
            #[cfg(feature = "tracing")]
            warn!(error = %err, "frame monitor disabled; keeping initial performance level");
            return Err(err);
        }
        self.inert = false;
        if self.state == MonitorState::Inactive {
            self.state = MonitorState::AwaitingSettle;
            self.last_tick = None;
        }
        Ok(())
    }

    /// Startup interactions finished; begin sampling.
    pub fn interactions_settled(&mut self) {
        if self.state == MonitorState::AwaitingSettle {
            self.state = MonitorState::Monitoring;
            self.last_tick = None;
            #[cfg(feature = "tracing")]
            debug!("frame monitor active");
        }
    }

    /// Unregister. Idempotent.
    pub fn stop(&mut self) {
        self.state = MonitorState::Inactive;
        self.last_tick = None;
    }

    /// Record a tick at `now`.
    ///
    /// Returns `None` unless monitoring, and for the baseline tick.
    pub fn on_frame(&mut self, now: Instant) -> Option<FrameSample> {
        if self.state != MonitorState::Monitoring {
            return None;
        }
        let Some(last) = self.last_tick.replace(now) else {
            return None;
        };
        let delta = now.saturating_duration_since(last);
        let dropped = self.config.is_drop(delta);
        self.frames = self.frames.saturating_add(1);
        if dropped {
            self.drops = self.drops.saturating_add(1);
        }
        Some(FrameSample {
            timestamp: now,
            delta,
            dropped,
        })
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Whether the host lacked frame callbacks at the last `start()`.
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Samples produced so far.
    #[inline]
    pub fn frames_observed(&self) -> u64 {
        self.frames
    }

    /// Drops classified so far.
    #[inline]
    pub fn drops_observed(&self) -> u64 {
        self.drops
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Default for FrameMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}
