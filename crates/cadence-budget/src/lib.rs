#![forbid(unsafe_code)]

//! Performance budget: observes frame pacing and maps it to a fidelity tier.
//!
//! - [`monitor`]: turns render-loop ticks into [`FrameSample`]s.
//! - [`governor`]: aggregates drop evidence into a [`PerformanceLevel`].
//! - [`policy`]: the static tier → [`PerformanceConfig`] table.
//! - [`context`]: the shared handle consumers receive at construction.
//! - [`probe`]: aggregate frame-rate statistics over a sampling window.

pub mod context;
pub mod governor;
pub mod monitor;
pub mod policy;
pub mod probe;

pub use cadence_core::level::{LevelSelection, ParseLevelError, PerformanceLevel};
pub use context::PerformanceContext;
pub use governor::{
    DeviceClass, GovernorConfig, GovernorTelemetry, LevelTransition, PerformanceGovernor,
    TransitionCause,
};
pub use monitor::{FrameMonitor, FrameSample, MonitorConfig, MonitorState};
pub use policy::{PerformanceConfig, policy};
pub use probe::{FrameRateProbe, FrameRateReport, PerformanceRating};
