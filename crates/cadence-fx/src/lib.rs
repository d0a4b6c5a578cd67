#![forbid(unsafe_code)]

//! Visual effects built on the Cadence orchestrator.
//!
//! - [`particles`]: confetti, explosion and sparkle bursts whose particle
//!   count and curve fidelity follow the current performance tier.

pub mod particles;

pub use particles::{
    Emission, KindProfile, Particle, ParticleConfig, ParticleDrawable, ParticleKind,
    ParticleOutcome, ParticlePhase, ParticleRun, ParticleShape, ParticleSystem,
    ParticleSystemRequest, ParticleTrigger, RequestError, Rgb,
};
