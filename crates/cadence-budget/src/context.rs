#![forbid(unsafe_code)]

//! Shared performance context.
//!
//! [`PerformanceContext`] is the one handle to the governor and frame
//! monitor. It is created by the host and cloned into every consumer at
//! construction; clones observe the same state.
//!
//! # Invariants
//!
//! A settings-store notification changes the selection only when the
//! store's manual level differs from the one it last reported. Pins set
//! through [`PerformanceContext::set_performance_level`] survive unrelated
//! settings changes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use cadence_core::host::{PlatformUnavailable, RenderLoop, UserSettings};
use cadence_core::level::{LevelSelection, PerformanceLevel};

use crate::governor::{GovernorTelemetry, LevelTransition, PerformanceGovernor};
use crate::monitor::{FrameMonitor, FrameSample, MonitorState};
use crate::policy::PerformanceConfig;

#[derive(Debug)]
struct Shared {
    governor: PerformanceGovernor,
    monitor: FrameMonitor,
    /// Manual level last reported by the settings store.
    store_override: Option<PerformanceLevel>,
}

/// Cloneable handle to the governor and its frame monitor.
#[derive(Debug, Clone)]
pub struct PerformanceContext {
    shared: Rc<RefCell<Shared>>,
}

impl PerformanceContext {
    /// Wrap a governor; the monitor shares its drop threshold.
    pub fn new(governor: PerformanceGovernor) -> Self {
        let monitor = FrameMonitor::new(governor.config().monitor_config());
        Self {
            shared: Rc::new(RefCell::new(Shared {
                governor,
                monitor,
                store_override: None,
            })),
        }
    }

    /// Effective level.
    pub fn level(&self) -> PerformanceLevel {
        self.shared.borrow().governor.level()
    }

    /// Policy record for the effective level.
    pub fn config(&self) -> PerformanceConfig {
        self.shared.borrow().governor.performance_config()
    }

    /// Current selection.
    pub fn selection(&self) -> LevelSelection {
        self.shared.borrow().governor.selection()
    }

    /// Pin a level or return to automatic selection.
    pub fn set_performance_level(&self, selection: LevelSelection) -> Option<LevelTransition> {
        self.shared.borrow_mut().governor.set_selection(selection)
    }

    /// Follow the manual level in `settings` when the store changed it.
    ///
    /// A new level pins it; a cleared level returns to automatic selection.
    /// Settings whose manual level is unchanged leave the selection alone.
    pub fn apply_settings(&self, settings: &UserSettings) -> Option<LevelTransition> {
        let desired = settings.performance_level_override;
        {
            let mut shared = self.shared.borrow_mut();
            if shared.store_override == desired {
                return None;
            }
            shared.store_override = desired;
        }
        self.set_performance_level(LevelSelection::from(desired))
    }

    /// Register the frame monitor with the render loop.
    pub fn start_monitoring(&self, render: &dyn RenderLoop) -> Result<(), PlatformUnavailable> {
        self.shared.borrow_mut().monitor.start(render)
    }

    /// Startup interactions settled; the monitor may begin sampling.
    pub fn interactions_settled(&self) {
        self.shared.borrow_mut().monitor.interactions_settled();
    }

    /// Tear down the frame monitor. Idempotent.
    pub fn stop_monitoring(&self) {
        self.shared.borrow_mut().monitor.stop();
    }

    /// Monitor lifecycle state.
    pub fn monitor_state(&self) -> MonitorState {
        self.shared.borrow().monitor.state()
    }

    /// Record a render-loop tick and feed the resulting sample to the
    /// governor.
    pub fn on_frame(&self, now: Instant) -> Option<LevelTransition> {
        let mut shared = self.shared.borrow_mut();
        let sample = shared.monitor.on_frame(now)?;
        shared.governor.observe(&sample)
    }

    /// Feed a sample produced elsewhere.
    pub fn observe(&self, sample: &FrameSample) -> Option<LevelTransition> {
        self.shared.borrow_mut().governor.observe(sample)
    }

    /// Take queued transitions, oldest first.
    pub fn drain_transitions(&self) -> Vec<LevelTransition> {
        self.shared.borrow_mut().governor.drain_transitions()
    }

    /// Governor telemetry snapshot.
    pub fn telemetry(&self) -> GovernorTelemetry {
        self.shared.borrow().governor.telemetry()
    }
}

impl Default for PerformanceContext {
    fn default() -> Self {
        Self::new(PerformanceGovernor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Loop;

    impl RenderLoop for Loop {
        fn supports_frame_callbacks(&self) -> bool {
            true
        }
    }

    #[test]
    fn clones_share_state() {
        let ctx = PerformanceContext::default();
        let other = ctx.clone();
        ctx.set_performance_level(LevelSelection::Pinned(PerformanceLevel::Low));
        assert_eq!(other.level(), PerformanceLevel::Low);
        assert_eq!(other.config().max_particle_count, 20);
    }

    #[test]
    fn frames_flow_into_governor() {
        let ctx = PerformanceContext::default();
        ctx.start_monitoring(&Loop).unwrap();
        ctx.interactions_settled();
        assert_eq!(ctx.monitor_state(), MonitorState::Monitoring);

        let mut now = Instant::now();
        assert!(ctx.on_frame(now).is_none());
        let mut transitions = Vec::new();
        for _ in 0..11 {
            now += Duration::from_millis(50);
            transitions.extend(ctx.on_frame(now));
        }
        assert_eq!(transitions.len(), 1);
        assert_eq!(ctx.level(), PerformanceLevel::Medium);
    }

    #[test]
    fn settings_override_pins_and_unpins() {
        let ctx = PerformanceContext::default();
        let pinned = UserSettings {
            performance_level_override: Some(PerformanceLevel::Critical),
            ..UserSettings::default()
        };
        assert!(ctx.apply_settings(&pinned).is_some());
        assert!(ctx.apply_settings(&pinned).is_none());
        assert_eq!(ctx.level(), PerformanceLevel::Critical);

        ctx.apply_settings(&UserSettings::default());
        assert_eq!(ctx.selection(), LevelSelection::Auto);
        assert_eq!(ctx.level(), PerformanceLevel::High);
    }

    #[test]
    fn unrelated_settings_keep_manual_pin() {
        let ctx = PerformanceContext::default();
        ctx.set_performance_level(LevelSelection::Pinned(PerformanceLevel::Low));
        let motion_only = UserSettings {
            reduce_motion: true,
            follow_system_reduce_motion: false,
            ..UserSettings::default()
        };
        assert!(ctx.apply_settings(&motion_only).is_none());
        assert!(ctx.apply_settings(&motion_only).is_none());
        assert_eq!(ctx.selection(), LevelSelection::Pinned(PerformanceLevel::Low));
    }

    #[test]
    fn store_pin_then_manual_auto_then_unrelated_push() {
        let ctx = PerformanceContext::default();
        let pinned = UserSettings {
            performance_level_override: Some(PerformanceLevel::Medium),
            ..UserSettings::default()
        };
        ctx.apply_settings(&pinned);
        ctx.set_performance_level(LevelSelection::Auto);
        // The store still reports Medium; nothing changed on its side.
        assert!(ctx.apply_settings(&pinned).is_none());
        assert_eq!(ctx.selection(), LevelSelection::Auto);
    }

    #[test]
    fn frames_ignored_until_settled() {
        let ctx = PerformanceContext::default();
        ctx.start_monitoring(&Loop).unwrap();
        let mut now = Instant::now();
        for _ in 0..30 {
            now += Duration::from_millis(100);
            assert!(ctx.on_frame(now).is_none());
        }
        assert_eq!(ctx.telemetry().total_frames, 0);
        ctx.stop_monitoring();
        assert_eq!(ctx.monitor_state(), MonitorState::Inactive);
    }
}
