#![forbid(unsafe_code)]

//! Cadence public facade crate.
//!
//! Adaptive animation: a frame-drop governor picks a performance tier, the
//! tier's policy shapes every animation and particle burst, and the
//! accessibility override can shorten or suppress motion regardless of tier.
//! [`Cadence`] wires the pieces to a host; the re-exports and [`prelude`]
//! cover day-to-day use.

use std::fmt;

mod app;

pub use app::{Cadence, CadenceBuilder};

// --- Core re-exports -------------------------------------------------------

pub use cadence_core::accessibility::{AccessibilityOptions, MotionPreferences};
pub use cadence_core::animation::{
    AnimatedValue, AnimationDescriptor, CubicBezier, Easing, FinishStatus, Motion, MotionEvent,
    OnFinish, Spring, SpringConfig, completion_slot,
};
pub use cadence_core::host::{
    AccessibilityService, PlatformUnavailable, RenderLoop, SettingsStore, Subscription,
    UserSettings,
};
pub use cadence_core::level::{LevelSelection, ParseLevelError, PerformanceLevel};

#[cfg(feature = "tracing-json")]
pub use cadence_core::logging::init_json_logging;

// --- Budget re-exports -----------------------------------------------------

pub use cadence_budget::{
    DeviceClass, FrameRateProbe, FrameRateReport, GovernorConfig, GovernorTelemetry,
    LevelTransition, PerformanceConfig, PerformanceContext, PerformanceRating, TransitionCause,
    policy,
};

// --- Runtime re-exports ----------------------------------------------------

pub use cadence_runtime::{
    AnimationHandle, AnimationOrchestrator, CompositionMode, FrameReport, RunStatus,
};

// --- Effects re-exports ----------------------------------------------------

pub use cadence_fx::{
    ParticleConfig, ParticleDrawable, ParticleKind, ParticleOutcome, ParticlePhase, ParticleShape,
    ParticleSystem, ParticleSystemRequest, ParticleTrigger, RequestError, Rgb,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Cadence hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed particle request.
    Request(RequestError),
    /// Unknown performance level name.
    ParseLevel(ParseLevelError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::ParseLevel(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::ParseLevel(err) => Some(err),
        }
    }
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Self::Request(err)
    }
}

impl From<ParseLevelError> for Error {
    fn from(err: ParseLevelError) -> Self {
        Self::ParseLevel(err)
    }
}

/// Standard result type for Cadence APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AnimatedValue, AnimationDescriptor, AnimationHandle, Cadence, CompositionMode, Easing,
        Error, LevelSelection, Motion, OnFinish, ParticleKind, ParticleSystem,
        ParticleSystemRequest, ParticleTrigger, PerformanceLevel, Result, SpringConfig,
    };

    pub use crate::{budget, core, fx, runtime};
}

pub use cadence_budget as budget;
pub use cadence_core as core;
pub use cadence_fx as fx;
pub use cadence_runtime as runtime;
