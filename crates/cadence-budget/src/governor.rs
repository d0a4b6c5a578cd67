#![forbid(unsafe_code)]

//! Performance level state machine.
//!
//! Aggregates [`FrameSample`]s into a [`PerformanceLevel`]:
//!
//! - Drops are counted within an evaluation window of frames. When the
//!   count exceeds `drops_per_downgrade`, the automatic level moves one step
//!   down and the counter and window restart. Each window boundary clears
//!   the counter.
//! - No automatic upgrade. `Critical` is terminal.
//! - A pin ([`LevelSelection::Pinned`]) overrides the effective level and
//!   suspends automatic transitions. Clearing it returns to the automatic
//!   level, which did not move while pinned.
//!
//! Transitions are queued as [`LevelTransition`]s for the host to drain.

use std::time::Duration;

use cadence_core::level::{LevelSelection, PerformanceLevel};

use crate::monitor::{DEFAULT_DROP_THRESHOLD, ENV_DROP_THRESHOLD_MS, FrameSample, MonitorConfig};
use crate::policy::{PerformanceConfig, policy};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Environment variable overriding `drops_per_downgrade`.
pub const ENV_DROPS_PER_DOWNGRADE: &str = "CADENCE_DROPS_PER_DOWNGRADE";
/// Environment variable overriding `evaluation_window` (frames).
pub const ENV_EVALUATION_WINDOW: &str = "CADENCE_EVALUATION_WINDOW";

/// Governor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorConfig {
    /// Gaps strictly longer than this are drops.
    pub drop_threshold: Duration,
    /// Downgrade once the drop count exceeds this.
    pub drops_per_downgrade: u32,
    /// Frames per evaluation window; `0` disables the window reset.
    pub evaluation_window: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            drops_per_downgrade: 10,
            evaluation_window: 60,
        }
    }
}

impl GovernorConfig {
    /// Defaults, with each field overridden by its environment variable
    /// when present and parseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let env_u64 = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
        };
        Self {
            drop_threshold: env_u64(ENV_DROP_THRESHOLD_MS)
                .filter(|ms| *ms > 0)
                .map_or(defaults.drop_threshold, Duration::from_millis),
            drops_per_downgrade: env_u64(ENV_DROPS_PER_DOWNGRADE)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.drops_per_downgrade),
            evaluation_window: env_u64(ENV_EVALUATION_WINDOW)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.evaluation_window),
        }
    }

    /// Set the drop threshold (builder).
    #[must_use]
    pub fn drop_threshold(mut self, threshold: Duration) -> Self {
        self.drop_threshold = threshold;
        self
    }

    /// Set the drop count that must be exceeded to downgrade (builder).
    #[must_use]
    pub fn drops_per_downgrade(mut self, drops: u32) -> Self {
        self.drops_per_downgrade = drops;
        self
    }

    /// Set the evaluation window in frames (builder).
    #[must_use]
    pub fn evaluation_window(mut self, frames: u32) -> Self {
        self.evaluation_window = frames;
        self
    }

    /// Monitor configuration sharing this drop threshold.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::default().drop_threshold(self.drop_threshold)
    }
}

/// Static device heuristic for the initial level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Android handsets: start at `Medium`.
    Android,
    /// iOS devices.
    Ios,
    /// Desktop operating systems.
    Desktop,
    /// Anything else.
    Other,
}

impl DeviceClass {
    /// Classify the compilation target.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "android" => Self::Android,
            "ios" => Self::Ios,
            "linux" | "macos" | "windows" | "freebsd" | "netbsd" | "openbsd" => Self::Desktop,
            _ => Self::Other,
        }
    }

    /// Level to start at absent a manual override.
    pub fn initial_level(self) -> PerformanceLevel {
        match self {
            Self::Android => PerformanceLevel::Medium,
            Self::Ios | Self::Desktop | Self::Other => PerformanceLevel::High,
        }
    }
}

/// Why the effective level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCause {
    /// Drop evidence exceeded the threshold.
    FrameDrops,
    /// A manual level was pinned.
    Pinned,
    /// The pin was cleared.
    Unpinned,
}

impl TransitionCause {
    /// Name for logging.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrameDrops => "frame_drops",
            Self::Pinned => "pinned",
            Self::Unpinned => "unpinned",
        }
    }
}

/// A change of the effective level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelTransition {
    /// Effective level before.
    pub from: PerformanceLevel,
    /// Effective level after.
    pub to: PerformanceLevel,
    /// What triggered it.
    pub cause: TransitionCause,
}

/// Snapshot of governor state for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorTelemetry {
    /// Effective level.
    pub level: PerformanceLevel,
    /// Automatically tracked level (ignores the pin).
    pub auto_level: PerformanceLevel,
    /// Active pin, if any.
    pub pinned: Option<PerformanceLevel>,
    /// Drops counted in the current window.
    pub drops_in_window: u32,
    /// Frames seen in the current window.
    pub frames_in_window: u32,
    /// Frames observed since construction.
    pub total_frames: u64,
    /// Drops observed since construction.
    pub total_drops: u64,
    /// Automatic downgrades since construction.
    pub downgrades: u32,
    /// Most recent transition.
    pub last_transition: Option<LevelTransition>,
}

/// The performance level state machine.
#[derive(Debug, Clone)]
pub struct PerformanceGovernor {
    config: GovernorConfig,
    auto_level: PerformanceLevel,
    pinned: Option<PerformanceLevel>,
    drops: u32,
    window_frames: u32,
    total_frames: u64,
    total_drops: u64,
    downgrades: u32,
    last_transition: Option<LevelTransition>,
    pending: Vec<LevelTransition>,
}

impl PerformanceGovernor {
    /// Start unpinned at `initial`.
    pub fn new(config: GovernorConfig, initial: PerformanceLevel) -> Self {
        Self {
            config,
            auto_level: initial,
            pinned: None,
            drops: 0,
            window_frames: 0,
            total_frames: 0,
            total_drops: 0,
            downgrades: 0,
            last_transition: None,
            pending: Vec::new(),
        }
    }

    /// Start at the device's initial level, or pinned to `manual` if given.
    pub fn for_device(
        config: GovernorConfig,
        device: DeviceClass,
        manual: Option<PerformanceLevel>,
    ) -> Self {
        let mut governor = Self::new(config, device.initial_level());
        governor.pinned = manual;
        governor
    }

    /// Effective level: the pin if set, else the automatic level.
    #[inline]
    pub fn level(&self) -> PerformanceLevel {
        self.pinned.unwrap_or(self.auto_level)
    }

    /// Automatically tracked level.
    #[inline]
    pub fn auto_level(&self) -> PerformanceLevel {
        self.auto_level
    }

    /// Current selection.
    pub fn selection(&self) -> LevelSelection {
        LevelSelection::from(self.pinned)
    }

    /// Policy record for the effective level.
    #[inline]
    pub fn performance_config(&self) -> PerformanceConfig {
        policy(self.level())
    }

    /// Tuning in use.
    #[inline]
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Feed one frame sample.
    pub fn observe(&mut self, sample: &FrameSample) -> Option<LevelTransition> {
        self.total_frames = self.total_frames.saturating_add(1);
        self.window_frames = self.window_frames.saturating_add(1);
        if sample.dropped {
            self.total_drops = self.total_drops.saturating_add(1);
            self.drops = self.drops.saturating_add(1);
        }

        let mut transition = None;
        if self.pinned.is_none()
            && self.drops > self.config.drops_per_downgrade
            && !self.auto_level.is_terminal()
        {
            let from = self.auto_level;
            self.auto_level = from.next();
            self.downgrades = self.downgrades.saturating_add(1);
            self.reset_window();

            #[cfg(feature = "tracing")]
            warn!(
                from = from.as_str(),
                to = self.auto_level.as_str(),
                total_drops = self.total_drops,
                "performance level downgraded"
            );

            transition = Some(self.record(from, self.auto_level, TransitionCause::FrameDrops));
        }

        if self.config.evaluation_window > 0 && self.window_frames >= self.config.evaluation_window
        {
            self.reset_window();
        }
        transition
    }

    /// Pin a level or return to automatic selection.
    ///
    /// Returns the transition when the effective level changed. The drop
    /// counter restarts either way.
    pub fn set_selection(&mut self, selection: LevelSelection) -> Option<LevelTransition> {
        let from = self.level();
        let cause = match selection {
            LevelSelection::Pinned(level) => {
                self.pinned = Some(level);
                TransitionCause::Pinned
            }
            LevelSelection::Auto => {
                self.pinned = None;
                TransitionCause::Unpinned
            }
        };
        self.reset_window();
        let to = self.level();

        #[cfg(feature = "tracing")]
        debug!(
            from = from.as_str(),
            to = to.as_str(),
            cause = cause.as_str(),
            "performance level selection changed"
        );

        (from != to).then(|| self.record(from, to, cause))
    }

    /// Take queued transitions, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<LevelTransition> {
        std::mem::take(&mut self.pending)
    }

    /// Capture a telemetry snapshot.
    pub fn telemetry(&self) -> GovernorTelemetry {
        GovernorTelemetry {
            level: self.level(),
            auto_level: self.auto_level,
            pinned: self.pinned,
            drops_in_window: self.drops,
            frames_in_window: self.window_frames,
            total_frames: self.total_frames,
            total_drops: self.total_drops,
            downgrades: self.downgrades,
            last_transition: self.last_transition,
        }
    }

    fn reset_window(&mut self) {
        self.drops = 0;
        self.window_frames = 0;
    }

    fn record(
        &mut self,
        from: PerformanceLevel,
        to: PerformanceLevel,
        cause: TransitionCause,
    ) -> LevelTransition {
        let transition = LevelTransition { from, to, cause };
        self.last_transition = Some(transition);
        self.pending.push(transition);
        transition
    }
}

impl Default for PerformanceGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default(), PerformanceLevel::High)
    }
}
