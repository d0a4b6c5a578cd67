#![forbid(unsafe_code)]

//! Runtime: composes and drives animations under the active performance
//! policy and accessibility options.

pub mod driver;
pub mod orchestrator;

pub use driver::{FrameDriver, FrameReport};
pub use orchestrator::{
    AnimationHandle, AnimationOrchestrator, CompositionMode, RealAnimation, RunStatus,
    SuppressedAnimation, compose,
};
