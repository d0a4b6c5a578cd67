#![forbid(unsafe_code)]

//! Spring physics.
//!
//! A [`Spring`] pulls a value from its start toward a target with a damped
//! harmonic force. It is tuned by tension and friction (the same knobs as
//! the timing tweens' duration and easing) and finishes when both the
//! distance to the target and the speed drop under their rest thresholds.
//!
//! # How it works
//!
//! Tension and friction are mapped onto stiffness and damping of a unit-mass
//! oscillator, which is then integrated in fixed 1 ms steps (semi-implicit
//! Euler). Frame time that does not fill a whole step is carried into the
//! next tick, so the trajectory does not depend on frame pacing.
//!
//! # Invariants
//!
//! 1. A spring at rest holds exactly its target value.
//! 2. A spring whose start equals its target is at rest before its first tick.
//! 3. A spring always settles within [`MAX_SPRING_DURATION`] of simulated
//!    time; one that has not come to rest by then is snapped to its target.

use std::time::Duration;

use super::Animation;

/// Default tension.
pub const DEFAULT_TENSION: f32 = 40.0;

/// Default friction.
pub const DEFAULT_FRICTION: f32 = 7.0;

/// Default rest threshold for both distance and speed, in value units.
pub const DEFAULT_REST_THRESHOLD: f32 = 0.01;

/// Friction multiplier applied under reduce motion.
pub const REDUCED_FRICTION_FACTOR: f32 = 1.5;

/// Rest threshold used under reduce motion.
pub const REDUCED_REST_THRESHOLD: f32 = 0.1;

/// Upper bound on simulated time before a spring is forced to rest.
pub const MAX_SPRING_DURATION: Duration = Duration::from_secs(10);

const STEP: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// SpringConfig
// ---------------------------------------------------------------------------

/// Tuning for a [`Spring`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    /// Pull toward the target. Higher is snappier.
    pub tension: f32,
    /// Resistance to motion. Higher bounces less.
    pub friction: f32,
    /// Distance from the target under which the spring may rest.
    pub rest_displacement_threshold: f32,
    /// Speed (units per second) under which the spring may rest.
    pub rest_speed_threshold: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            tension: DEFAULT_TENSION,
            friction: DEFAULT_FRICTION,
            rest_displacement_threshold: DEFAULT_REST_THRESHOLD,
            rest_speed_threshold: DEFAULT_REST_THRESHOLD,
        }
    }
}

impl SpringConfig {
    /// A spring with the given tension and friction and default thresholds.
    pub fn new(tension: f32, friction: f32) -> Self {
        Self {
            tension,
            friction,
            ..Self::default()
        }
    }

    /// Set both rest thresholds (builder).
    #[must_use]
    pub fn rest_threshold(mut self, threshold: f32) -> Self {
        self.rest_displacement_threshold = threshold;
        self.rest_speed_threshold = threshold;
        self
    }

    /// The reduce-motion variant: friction raised by
    /// [`REDUCED_FRICTION_FACTOR`] and both thresholds raised to at least
    /// [`REDUCED_REST_THRESHOLD`].
    #[must_use]
    pub fn reduced(self) -> Self {
        Self {
            tension: self.tension,
            friction: self.friction * REDUCED_FRICTION_FACTOR,
            rest_displacement_threshold: self
                .rest_displacement_threshold
                .max(REDUCED_REST_THRESHOLD),
            rest_speed_threshold: self.rest_speed_threshold.max(REDUCED_REST_THRESHOLD),
        }
    }

    /// Oscillator stiffness for this tension.
    pub fn stiffness(&self) -> f64 {
        ((f64::from(self.tension) - 30.0) * 3.62 + 194.0).max(0.0)
    }

    /// Oscillator damping for this friction.
    pub fn damping(&self) -> f64 {
        ((f64::from(self.friction) - 8.0) * 3.0 + 25.0).max(0.0)
    }

    /// Simulated time a spring needs to travel `span` units from rest.
    pub fn settle_duration(&self, span: f32) -> Duration {
        let mut spring = Spring::new(*self, 0.0, span);
        spring.tick(MAX_SPRING_DURATION);
        spring.settled_at.unwrap_or(MAX_SPRING_DURATION)
    }
}

// ---------------------------------------------------------------------------
// Spring
// ---------------------------------------------------------------------------

/// A spring travelling from `from` to `to`.
///
/// [`Animation::value`] reports normalized progress, which leaves [0, 1]
/// while the spring overshoots; [`position`](Self::position) is the value
/// in target units.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    from: f64,
    to: f64,
    position: f64,
    velocity: f64,
    simulated: Duration,
    carry: Duration,
    ticked: Duration,
    settled_at: Option<Duration>,
}

impl Spring {
    /// A spring at rest at `from`, about to travel to `to`.
    pub fn new(config: SpringConfig, from: f32, to: f32) -> Self {
        let mut spring = Self {
            config,
            from: f64::from(from),
            to: f64::from(to),
            position: f64::from(from),
            velocity: 0.0,
            simulated: Duration::ZERO,
            carry: Duration::ZERO,
            ticked: Duration::ZERO,
            settled_at: None,
        };
        spring.check_rest();
        spring
    }

    /// Current value in target units.
    pub fn position(&self) -> f32 {
        self.position as f32
    }

    /// Current speed in units per second.
    pub fn velocity(&self) -> f32 {
        self.velocity as f32
    }

    /// Tuning in use.
    pub fn config(&self) -> SpringConfig {
        self.config
    }

    fn check_rest(&mut self) {
        let near = (self.to - self.position).abs()
            <= f64::from(self.config.rest_displacement_threshold);
        let slow = self.velocity.abs() <= f64::from(self.config.rest_speed_threshold);
        if (near && slow) || self.simulated >= MAX_SPRING_DURATION {
            self.position = self.to;
            self.velocity = 0.0;
            self.settled_at = Some(self.simulated);
        }
    }

    fn step(&mut self) {
        let h = STEP.as_secs_f64();
        let force = self.config.stiffness() * (self.to - self.position)
            - self.config.damping() * self.velocity;
        self.velocity += force * h;
        self.position += self.velocity * h;
        self.simulated += STEP;
        self.check_rest();
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        self.ticked = self.ticked.saturating_add(dt);
        if self.settled_at.is_some() {
            return;
        }
        self.carry = self.carry.saturating_add(dt);
        while self.carry >= STEP && self.settled_at.is_none() {
            self.carry -= STEP;
            self.step();
        }
    }

    fn is_complete(&self) -> bool {
        self.settled_at.is_some()
    }

    fn value(&self) -> f32 {
        let span = self.to - self.from;
        if self.is_complete() || span == 0.0 {
            return 1.0;
        }
        ((self.position - self.from) / span) as f32
    }

    fn reset(&mut self) {
        *self = Self::new(self.config, self.from as f32, self.to as f32);
    }

    fn overshoot(&self) -> Duration {
        self.settled_at
            .map_or(Duration::ZERO, |at| self.ticked.saturating_sub(at))
    }
}
