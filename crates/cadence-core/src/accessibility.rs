#![forbid(unsafe_code)]

//! Accessibility override.
//!
//! Folds the motion-related signals into one [`AccessibilityOptions`]
//! snapshot, independent of the performance tier:
//!
//! | signal                   | source                                  |
//! |--------------------------|-----------------------------------------|
//! | app animations switch    | settings store                          |
//! | runtime available        | host capability                         |
//! | platform reduce motion   | accessibility service (pushed changes)  |
//! | user reduce motion       | settings store, with a follow-system toggle |
//!
//! `animations_enabled = app switch && runtime available`. Reduce motion
//! comes from the platform while following the system, otherwise from the
//! user's own choice. The snapshot is recomputed on every read, so there
//! is nothing to invalidate.
//!
//! Under reduce motion, timed animations run at [`REDUCED_MOTION_SCALE`] of
//! their duration on linear curves, and springs take
//! [`SpringConfig::reduced`](crate::animation::SpringConfig::reduced): more
//! friction and coarser rest thresholds.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::animation::{AnimationDescriptor, Motion, scale_duration};
use crate::host::{AccessibilityService, Subscription, UserSettings};
use crate::{debug, warn};

/// Duration multiplier applied while reduce motion is active.
pub const REDUCED_MOTION_SCALE: f32 = 0.5;

/// Effective accessibility configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessibilityOptions {
    /// `false` suppresses every animation.
    pub animations_enabled: bool,
    /// Shorten durations, linearize curves and damp springs.
    pub reduce_motion: bool,
    /// [`REDUCED_MOTION_SCALE`] under reduce motion, else `1.0`.
    pub duration_scale: f32,
}

impl Default for AccessibilityOptions {
    fn default() -> Self {
        Self {
            animations_enabled: true,
            reduce_motion: false,
            duration_scale: 1.0,
        }
    }
}

impl AccessibilityOptions {
    /// Scale a duration or delay.
    pub fn scale_duration(&self, d: Duration) -> Duration {
        if self.reduce_motion {
            scale_duration(d, self.duration_scale)
        } else {
            d
        }
    }

    /// Apply reduce motion to a whole tree. Identity otherwise.
    pub fn adapt(&self, motion: &Motion) -> Motion {
        if self.reduce_motion {
            motion.adjusted(self.duration_scale, true)
        } else {
            motion.clone()
        }
    }

    /// Apply reduce motion to one descriptor. Identity otherwise.
    pub fn adapt_descriptor(&self, descriptor: &AnimationDescriptor) -> AnimationDescriptor {
        if self.reduce_motion {
            descriptor.adjusted(self.duration_scale, true)
        } else {
            descriptor.clone()
        }
    }
}

/// The raw signals behind [`AccessibilityOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityState {
    app_animations_enabled: bool,
    runtime_available: bool,
    platform_reduce_motion: bool,
    user_reduce_motion: bool,
    follow_system: bool,
}

impl Default for AccessibilityState {
    fn default() -> Self {
        Self {
            app_animations_enabled: true,
            runtime_available: true,
            platform_reduce_motion: false,
            user_reduce_motion: false,
            follow_system: true,
        }
    }
}

impl AccessibilityState {
    /// Merge the signals.
    pub fn options(&self) -> AccessibilityOptions {
        let reduce_motion = if self.follow_system {
            self.platform_reduce_motion
        } else {
            self.user_reduce_motion
        };
        AccessibilityOptions {
            animations_enabled: self.app_animations_enabled && self.runtime_available,
            reduce_motion,
            duration_scale: if reduce_motion {
                REDUCED_MOTION_SCALE
            } else {
                1.0
            },
        }
    }

    /// Take the motion-related fields of `settings`.
    pub fn apply_settings(&mut self, settings: &UserSettings) {
        self.app_animations_enabled = settings.animations_enabled;
        self.follow_system = settings.follow_system_reduce_motion;
        self.user_reduce_motion = settings.reduce_motion;
    }

    /// Set the app-level animations switch.
    pub fn set_app_animations_enabled(&mut self, enabled: bool) {
        self.app_animations_enabled = enabled;
    }

    /// Record whether the host can run animations at all.
    pub fn set_runtime_available(&mut self, available: bool) {
        self.runtime_available = available;
    }

    /// Record the platform reduce-motion flag.
    pub fn set_platform_reduce_motion(&mut self, enabled: bool) {
        self.platform_reduce_motion = enabled;
    }

    /// Set the user's reduce-motion preference.
    pub fn set_user_reduce_motion(&mut self, follow_system: bool, reduce_motion: bool) {
        self.follow_system = follow_system;
        self.user_reduce_motion = reduce_motion;
    }
}

/// Shared, cloneable handle to the accessibility signals.
///
/// Every consumer reads [`options`](Self::options) at its entry point.
#[derive(Debug, Clone, Default)]
pub struct MotionPreferences {
    state: Rc<RefCell<AccessibilityState>>,
}

impl MotionPreferences {
    /// Defaults: animations on, reduce motion off, following the system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current merged snapshot.
    pub fn options(&self) -> AccessibilityOptions {
        self.state.borrow().options()
    }

    /// Copy of the raw signals.
    pub fn state(&self) -> AccessibilityState {
        self.state.borrow().clone()
    }

    /// Apply a change to the signals, logging when the snapshot moves.
    pub fn update(&self, f: impl FnOnce(&mut AccessibilityState)) {
        let mut state = self.state.borrow_mut();
        let before = state.options();
        f(&mut state);
        let after = state.options();
        if before != after {
            debug!(
                animations_enabled = after.animations_enabled,
                reduce_motion = after.reduce_motion,
                "accessibility options changed"
            );
        }
    }

    /// Take the motion-related fields of `settings`.
    pub fn apply_settings(&self, settings: &UserSettings) {
        self.update(|s| s.apply_settings(settings));
    }

    /// Record the platform reduce-motion flag.
    pub fn set_platform_reduce_motion(&self, enabled: bool) {
        self.update(|s| s.set_platform_reduce_motion(enabled));
    }

    /// Record whether the host can run animations at all.
    pub fn set_runtime_available(&self, available: bool) {
        self.update(|s| s.set_runtime_available(available));
    }

    /// Query the platform flag once, then follow its pushed changes.
    ///
    /// An unavailable query leaves reduce motion off; an unavailable
    /// subscription returns `None`. Both are logged and absorbed.
    pub fn bind_platform(&self, service: &dyn AccessibilityService) -> Option<Subscription> {
        match service.reduce_motion_enabled() {
            Ok(enabled) => self.set_platform_reduce_motion(enabled),
            Err(_err) => {
                warn!(error = %_err, "reduce-motion query failed; assuming disabled");
                self.set_platform_reduce_motion(false);
            }
        }

        let weak: Weak<RefCell<AccessibilityState>> = Rc::downgrade(&self.state);
        let listener = Box::new(move |enabled: bool| {
            if let Some(state) = weak.upgrade() {
                MotionPreferences { state }.set_platform_reduce_motion(enabled);
            }
        });
        match service.subscribe_reduce_motion(listener) {
            Ok(sub) => Some(sub),
            Err(_err) => {
                warn!(error = %_err, "reduce-motion subscription failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedValue, Easing, Motion, SpringConfig};
    use crate::host::PlatformUnavailable;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn defaults_leave_motion_untouched() {
        let opts = AccessibilityState::default().options();
        assert!(opts.animations_enabled);
        assert!(!opts.reduce_motion);
        assert_eq!(opts.duration_scale, 1.0);
    }

    #[test]
    fn enabled_requires_both_switch_and_runtime() {
        let mut state = AccessibilityState::default();
        state.set_runtime_available(false);
        assert!(!state.options().animations_enabled);
        state.set_runtime_available(true);
        state.set_app_animations_enabled(false);
        assert!(!state.options().animations_enabled);
    }

    #[test]
    fn follow_system_picks_platform_flag() {
        let mut state = AccessibilityState::default();
        state.set_platform_reduce_motion(true);
        assert!(state.options().reduce_motion);
        assert_eq!(state.options().duration_scale, REDUCED_MOTION_SCALE);

        state.set_user_reduce_motion(false, false);
        assert!(!state.options().reduce_motion);

        state.set_user_reduce_motion(false, true);
        state.set_platform_reduce_motion(false);
        assert!(state.options().reduce_motion);
    }

    #[test]
    fn apply_settings_reads_motion_fields() {
        let mut state = AccessibilityState::default();
        state.apply_settings(&UserSettings {
            animations_enabled: false,
            follow_system_reduce_motion: false,
            reduce_motion: true,
            ..UserSettings::default()
        });
        let opts = state.options();
        assert!(!opts.animations_enabled);
        assert!(opts.reduce_motion);
    }

    #[test]
    fn adapt_halves_and_linearizes() {
        let v = AnimatedValue::new(0.0);
        let d = AnimationDescriptor::timing(&v, 1.0, Duration::from_millis(300))
            .easing(Easing::OutCubic);
        let reduced = AccessibilityOptions {
            animations_enabled: true,
            reduce_motion: true,
            duration_scale: REDUCED_MOTION_SCALE,
        };
        let out = reduced.adapt_descriptor(&d);
        assert_eq!(out.duration(), Duration::from_millis(150));
        assert!(out.curve().is_linear());

        let same = AccessibilityOptions::default().adapt_descriptor(&d);
        assert_eq!(same.duration(), d.duration());
        assert_eq!(same.curve(), Easing::OutCubic);
    }

    #[test]
    fn adapt_damps_springs_in_trees() {
        let v = AnimatedValue::new(0.0);
        let w = AnimatedValue::new(0.0);
        let tree = Motion::sequence([
            AnimationDescriptor::spring(&v, 1.0, SpringConfig::new(40.0, 6.0)),
            AnimationDescriptor::timing(&w, 1.0, Duration::from_millis(200)),
        ]);
        let reduced = AccessibilityOptions {
            animations_enabled: true,
            reduce_motion: true,
            duration_scale: REDUCED_MOTION_SCALE,
        }
        .adapt(&tree);

        let mut springs = Vec::new();
        let mut durations = Vec::new();
        reduced.for_each_descriptor(&mut |d| {
            springs.extend(d.spring_config());
            durations.push(d.duration());
        });
        assert_eq!(springs.len(), 1);
        assert_eq!(springs[0].friction, 9.0);
        assert_eq!(springs[0].rest_displacement_threshold, 0.1);
        assert_eq!(durations[1], Duration::from_millis(100));

        let untouched = AccessibilityOptions::default().adapt(&tree);
        untouched.for_each_descriptor(&mut |d| {
            if let Some(config) = d.spring_config() {
                assert_eq!(config, SpringConfig::new(40.0, 6.0));
            }
        });
    }

    struct FakeService {
        flag: Result<bool, PlatformUnavailable>,
        listener: StdRefCell<Option<Box<dyn FnMut(bool)>>>,
    }

    impl AccessibilityService for FakeService {
        fn reduce_motion_enabled(&self) -> Result<bool, PlatformUnavailable> {
            self.flag
        }

        fn subscribe_reduce_motion(
            &self,
            listener: Box<dyn FnMut(bool)>,
        ) -> Result<Subscription, PlatformUnavailable> {
            self.flag?;
            *self.listener.borrow_mut() = Some(listener);
            Ok(Subscription::detached())
        }
    }

    #[test]
    fn bind_platform_queries_then_follows_pushes() {
        let prefs = MotionPreferences::new();
        let service = FakeService {
            flag: Ok(true),
            listener: StdRefCell::new(None),
        };
        let sub = prefs.bind_platform(&service);
        assert!(sub.is_some());
        assert!(prefs.options().reduce_motion);

        if let Some(listener) = service.listener.borrow_mut().as_mut() {
            listener(false);
        }
        assert!(!prefs.options().reduce_motion);
    }

    #[test]
    fn bind_platform_absorbs_unavailable() {
        let prefs = MotionPreferences::new();
        prefs.set_platform_reduce_motion(true);
        let service = FakeService {
            flag: Err(PlatformUnavailable::new("reduce-motion query")),
            listener: StdRefCell::new(None),
        };
        assert!(prefs.bind_platform(&service).is_none());
        assert!(!prefs.options().reduce_motion);
    }
}
