#![forbid(unsafe_code)]

//! Host collaborator interfaces.
//!
//! The engine never talks to a platform directly. Hosts implement these
//! traits and hand them to the facade:
//!
//! - [`RenderLoop`]: whether per-frame callbacks exist at all.
//! - [`AccessibilityService`]: the platform reduce-motion flag.
//! - [`SettingsStore`]: the user's persisted preferences.
//!
//! Change notifications are push-based and return a [`Subscription`] guard;
//! dropping the guard unsubscribes.

use std::fmt;

use crate::level::PerformanceLevel;

/// A platform primitive the engine relies on is missing.
///
/// Always absorbed with a safe default and a log line; never surfaced to
/// callers of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformUnavailable {
    primitive: &'static str,
}

impl PlatformUnavailable {
    /// Report that `primitive` is unavailable.
    pub const fn new(primitive: &'static str) -> Self {
        Self { primitive }
    }

    /// Name of the missing primitive.
    pub fn primitive(&self) -> &'static str {
        self.primitive
    }
}

impl fmt::Display for PlatformUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform primitive unavailable: {}", self.primitive)
    }
}

impl std::error::Error for PlatformUnavailable {}

/// RAII guard for a change subscription.
///
/// Runs the host-provided cancel hook exactly once, on
/// [`unsubscribe`](Self::unsubscribe) or drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Guard that calls `cancel` when released.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Guard with nothing to release.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Release the subscription now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The host's frame loop.
pub trait RenderLoop {
    /// Whether per-frame callbacks are available. When `false` the frame
    /// monitor stays inert and the initial tier is kept.
    fn supports_frame_callbacks(&self) -> bool;
}

/// Platform accessibility preferences.
pub trait AccessibilityService {
    /// Current reduce-motion flag.
    fn reduce_motion_enabled(&self) -> Result<bool, PlatformUnavailable>;

    /// Push future changes of the flag to `listener`.
    fn subscribe_reduce_motion(
        &self,
        listener: Box<dyn FnMut(bool)>,
    ) -> Result<Subscription, PlatformUnavailable>;
}

/// User preferences relevant to motion, as read from the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UserSettings {
    /// Master switch; `false` suppresses all motion.
    pub animations_enabled: bool,
    /// Manual tier; `Some` pins the governor.
    pub performance_level_override: Option<PerformanceLevel>,
    /// Let the platform flag decide reduce motion.
    pub follow_system_reduce_motion: bool,
    /// The user's own reduce-motion choice, used when not following the system.
    pub reduce_motion: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            animations_enabled: true,
            performance_level_override: None,
            follow_system_reduce_motion: true,
            reduce_motion: false,
        }
    }
}

/// Persisted user settings. The storage format is the host's business.
pub trait SettingsStore {
    /// Current settings.
    fn settings(&self) -> UserSettings;

    /// Push future changes to `listener`.
    fn subscribe(&self, listener: Box<dyn FnMut(&UserSettings)>) -> Subscription;
}
