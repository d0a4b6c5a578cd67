#![forbid(unsafe_code)]

//! Tier-aware particle bursts.
//!
//! A [`ParticleSystem`] turns one [`ParticleSystemRequest`] into a batch of
//! particles, each animated by its own composite [`Motion`], and runs the
//! batch as one orchestrated group.
//!
//! # How it works
//!
//! 1. The request is validated; malformed input fails fast.
//! 2. The count is capped by the current [`PerformanceConfig`]. A zero cap,
//!    or disabled animations, completes the trigger synchronously with no
//!    particle created.
//! 3. Particles are sampled from the instance's RNG and the kind's
//!    [`KindProfile`]. The simplified curve set is used when the policy asks
//!    for simplified easing.
//! 4. The per-particle motions run staggered (when the policy allows) or in
//!    parallel. When the group finishes the particles are discarded and
//!    `on_complete` fires.
//!
//! # Invariants
//!
//! 1. At most one generation is live per instance. Triggers while one is
//!    live are ignored and do not disturb it.
//! 2. `on_complete` fires at most once per accepted trigger, and never for a
//!    cancelled generation.
//! 3. The particle count never exceeds the policy's `max_particle_count`.
//!
//! [`PerformanceConfig`]: cadence_budget::PerformanceConfig

mod emitter;
mod kind;
mod request;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use cadence_core::animation::{FinishStatus, Motion, OnFinish};
use cadence_runtime::{AnimationHandle, AnimationOrchestrator, CompositionMode, RunStatus};
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[cfg(feature = "tracing")]
use tracing::debug;

pub use emitter::{
    MAX_SPEED, MAX_TURNS, MIN_SPEED, Particle, ParticleDrawable, ParticleTarget, REFERENCE_SPEED,
    SIZE_RANGE,
};
pub use kind::{
    CurveSet, Emission, KindProfile, ParticleKind, ParticleShape, PhaseSpec, Rgb, RotationSpec,
};
pub use request::{ParticleSystemRequest, RequestError, ValidRequest};

/// Particles per request when the caller does not say.
pub const DEFAULT_PARTICLE_COUNT: u32 = 50;
/// Burst duration when the caller does not say.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(1500);
/// Gap between particle starts when the policy allows stagger.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(20);

/// Environment variable fixing the RNG seed (for replays).
pub const ENV_PARTICLE_SEED: &str = "CADENCE_PARTICLE_SEED";
/// Environment variable overriding the stagger gap in milliseconds.
pub const ENV_PARTICLE_STAGGER_MS: &str = "CADENCE_PARTICLE_STAGGER_MS";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Particle system tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleConfig {
    /// Gap between particle starts when staggering.
    pub stagger: Duration,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
            seed: None,
        }
    }
}

impl ParticleConfig {
    /// Defaults overridden by `CADENCE_PARTICLE_SEED` and
    /// `CADENCE_PARTICLE_STAGGER_MS`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let env_u64 = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
        };
        Self {
            stagger: env_u64(ENV_PARTICLE_STAGGER_MS).map_or(defaults.stagger, Duration::from_millis),
            seed: env_u64(ENV_PARTICLE_SEED).or(defaults.seed),
        }
    }

    /// Set the stagger gap (builder).
    #[must_use]
    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Fix the RNG seed (builder).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ---------------------------------------------------------------------------
// Lifecycle types
// ---------------------------------------------------------------------------

/// Where an instance is in its trigger cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticlePhase {
    /// No live generation; triggers are accepted.
    Idle,
    /// Sampling particles and building their motions.
    Generating,
    /// A generation is on screen.
    Animating,
}

/// How the last generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleOutcome {
    /// Ran to the end, or had nothing to animate.
    Completed,
    /// Torn down by `cancel()`, or its run was stopped on the orchestrator.
    Cancelled,
}

/// Result of [`ParticleSystem::trigger`].
#[derive(Debug)]
pub enum ParticleTrigger {
    /// A generation is animating.
    Started(ParticleRun),
    /// Nothing to animate; `on_complete` already ran.
    CompletedImmediately,
    /// Another generation was live; `on_complete` was dropped unrun.
    Ignored,
}

impl ParticleTrigger {
    /// Cancel the started generation. `false` for the other variants or a
    /// generation that already ended.
    pub fn cancel(&self) -> bool {
        match self {
            Self::Started(run) => run.cancel(),
            Self::CompletedImmediately | Self::Ignored => false,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

/// Handle to one accepted generation.
#[derive(Debug, Clone)]
pub struct ParticleRun {
    state: Weak<RefCell<State>>,
    generation: u64,
}

impl ParticleRun {
    /// Stop every particle animation and discard the particles.
    /// Returns whether this generation was still live.
    pub fn cancel(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| cancel_generation(&state, self.generation))
    }

    /// Whether this generation is still animating.
    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().is_live(self.generation))
    }
}

// ---------------------------------------------------------------------------
// ParticleSystem
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct State {
    phase: ParticlePhase,
    last_outcome: Option<ParticleOutcome>,
    kind: Option<ParticleKind>,
    origin: (f32, f32),
    particles: Vec<Particle>,
    handle: Option<AnimationHandle>,
    generation: u64,
    rng: SmallRng,
}

impl State {
    fn is_live(&self, generation: u64) -> bool {
        self.generation == generation && self.phase == ParticlePhase::Animating
    }

    /// Retire a live generation whose run was stopped from outside (for
    /// example by `stop_all`).
    fn reap_stopped(&mut self) -> Option<AnimationHandle> {
        let stopped = self
            .handle
            .as_ref()
            .is_some_and(|h| h.status() == RunStatus::Stopped);
        if stopped {
            self.retire(self.generation, ParticleOutcome::Cancelled)
        } else {
            None
        }
    }

    /// End `generation` if it is live, returning its handle for the caller
    /// to stop or drop once the borrow is released.
    fn retire(&mut self, generation: u64, outcome: ParticleOutcome) -> Option<AnimationHandle> {
        if !self.is_live(generation) {
            return None;
        }
        self.phase = ParticlePhase::Idle;
        self.last_outcome = Some(outcome);
        self.kind = None;
        self.particles.clear();
        self.handle.take()
    }
}

fn cancel_generation(state: &RefCell<State>, generation: u64) -> bool {
    let (live, handle) = {
        let mut state = state.borrow_mut();
        let live = state.is_live(generation);
        (live, state.retire(generation, ParticleOutcome::Cancelled))
    };
    if let Some(handle) = handle {
        handle.stop();
    }
    #[cfg(feature = "tracing")]
    if live {
        debug!(generation, "particle generation cancelled");
    }
    live
}

/// One particle emitter. Clones share the same instance.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    orchestrator: AnimationOrchestrator,
    config: ParticleConfig,
    state: Rc<RefCell<State>>,
}

impl ParticleSystem {
    /// An idle instance running its animations on `orchestrator`.
    pub fn new(orchestrator: AnimationOrchestrator, config: ParticleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            orchestrator,
            config,
            state: Rc::new(RefCell::new(State {
                phase: ParticlePhase::Idle,
                last_outcome: None,
                kind: None,
                origin: (0.0, 0.0),
                particles: Vec::new(),
                handle: None,
                generation: 0,
                rng,
            })),
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &AnimationOrchestrator {
        &self.orchestrator
    }

    /// Replace the RNG with one seeded from `seed`.
    pub fn reseed(&self, seed: u64) {
        self.state.borrow_mut().rng = SmallRng::seed_from_u64(seed);
    }

    /// Emit one burst.
    ///
    /// `on_complete` runs once when the burst ends naturally, synchronously
    /// when there is nothing to animate, and never when the trigger is
    /// ignored or the generation is cancelled.
    pub fn trigger(
        &self,
        request: &ParticleSystemRequest,
        on_complete: OnFinish,
    ) -> Result<ParticleTrigger, RequestError> {
        let request = request.validate()?;

        self.reap();
        if self.state.borrow().phase != ParticlePhase::Idle {
            #[cfg(feature = "tracing")]
            debug!(
                kind = request.kind.as_str(),
                "particle generation in flight; trigger ignored"
            );
            return Ok(ParticleTrigger::Ignored);
        }

        let policy = self.orchestrator.performance().config();
        let count = policy.effective_count(request.count);
        if count == 0 || !self.orchestrator.preferences().options().animations_enabled {
            #[cfg(feature = "tracing")]
            debug!(
                kind = request.kind.as_str(),
                requested = request.count,
                level = policy.level.as_str(),
                "no particles to animate; completing immediately"
            );
            self.state.borrow_mut().last_outcome = Some(ParticleOutcome::Completed);
            on_complete.fire(FinishStatus::Completed);
            return Ok(ParticleTrigger::CompletedImmediately);
        }

        let (generation, members) = self.generate(&request, policy.simplified_easing, count);
        let mode = if policy.use_stagger {
            CompositionMode::Stagger(self.config.stagger)
        } else {
            CompositionMode::Parallel
        };
        let handle = self.orchestrator.run_animation(members, mode);

        let weak = Rc::downgrade(&self.state);
        handle.start(OnFinish::new(move |status| {
            if let Some(state) = weak.upgrade() {
                let handle = state
                    .borrow_mut()
                    .retire(generation, ParticleOutcome::Completed);
                drop(handle);
            }
            on_complete.fire(status);
        }));

        // A synchronous finish has already retired the generation.
        let leftover = {
            let mut state = self.state.borrow_mut();
            if state.is_live(generation) {
                state.handle = Some(handle);
                None
            } else {
                Some(handle)
            }
        };
        drop(leftover);

        Ok(ParticleTrigger::Started(ParticleRun {
            state: Rc::downgrade(&self.state),
            generation,
        }))
    }

    fn generate(&self, request: &ValidRequest, simplified: bool, count: u32) -> (u64, Vec<Motion>) {
        let profile = request.kind.profile();
        let curves = profile.curves(simplified);

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.phase = ParticlePhase::Generating;
        state.generation = state.generation.wrapping_add(1);
        state.kind = Some(request.kind);
        state.origin = request.origin;
        state.particles = (0..count)
            .map(|id| Particle::generate(id, profile, curves.travel_scale, &mut state.rng))
            .collect();
        let members = state
            .particles
            .iter()
            .map(|p| p.motion(curves, request.duration))
            .collect();
        state.phase = ParticlePhase::Animating;
        (state.generation, members)
    }

    fn reap(&self) {
        let handle = self.state.borrow_mut().reap_stopped();
        drop(handle);
    }

    /// Cancel the live generation, if any.
    pub fn cancel(&self) -> bool {
        let generation = self.state.borrow().generation;
        cancel_generation(&self.state, generation)
    }

    pub fn phase(&self) -> ParticlePhase {
        self.reap();
        self.state.borrow().phase
    }

    /// How the most recent generation ended.
    pub fn last_outcome(&self) -> Option<ParticleOutcome> {
        self.reap();
        self.state.borrow().last_outcome
    }

    /// Kind of the live generation.
    pub fn kind(&self) -> Option<ParticleKind> {
        self.reap();
        self.state.borrow().kind
    }

    /// Live particles.
    pub fn particle_count(&self) -> usize {
        self.reap();
        self.state.borrow().particles.len()
    }

    /// Renderer snapshot of every live particle, in generation order.
    pub fn drawables(&self) -> Vec<ParticleDrawable> {
        self.reap();
        let state = self.state.borrow();
        state
            .particles
            .iter()
            .map(|p| p.drawable(state.origin))
            .collect()
    }
}
