#![forbid(unsafe_code)]

//! Particle generation and per-particle motion.
//!
//! Each particle gets its random targets once, at generation, and a
//! [`Motion`] that tweens its channels towards them:
//!
//! ```text
//! parallel ┬ x        0 → dx               travel curve, full duration
//!          ├ y        0 → dy               travel curve, full duration
//!          ├ rotation 0 → turns * mult     (omitted when the set has none)
//!          ├ scale    sequence [phase 0, phase 1]
//!          └ opacity  sequence [phase 0, phase 1]
//! ```
//!
//! Channels hold offsets from the burst origin; [`ParticleDrawable`] adds
//! the origin back.

use std::time::Duration;

use cadence_core::animation::{AnimatedValue, AnimationDescriptor, Motion, scale_duration};
use rand::Rng;

use super::kind::{CurveSet, KindProfile, ParticleShape, PhaseSpec, Rgb};

/// Lower bound of the sampled launch speed.
pub const MIN_SPEED: f32 = 50.0;
/// Upper bound (exclusive) of the sampled launch speed.
pub const MAX_SPEED: f32 = 200.0;
/// Speed at which a particle travels exactly its kind's nominal distance.
pub const REFERENCE_SPEED: f32 = 125.0;
/// Bound of the rotation target in turns (sampled from `[-max, max)`).
pub const MAX_TURNS: f32 = 5.0;
/// Particle edge length range in points (`[min, max)`).
pub const SIZE_RANGE: (f32, f32) = (4.0, 10.0);

/// Where one particle ends up, relative to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleTarget {
    pub dx: f32,
    pub dy: f32,
    /// Rotation target in turns, before the curve set's multiplier.
    pub turns: f32,
}

/// One live particle. Channels are written by its own motion only.
#[derive(Debug)]
pub struct Particle {
    pub id: u32,
    pub x: AnimatedValue,
    pub y: AnimatedValue,
    /// In turns.
    pub rotation: AnimatedValue,
    pub scale: AnimatedValue,
    pub opacity: AnimatedValue,
    pub color: Rgb,
    pub shape: ParticleShape,
    pub size: f32,
    pub target: ParticleTarget,
}

impl Particle {
    /// Sample a particle of `profile` with every channel at zero.
    pub fn generate<R: Rng + ?Sized>(
        id: u32,
        profile: &KindProfile,
        travel_scale: f32,
        rng: &mut R,
    ) -> Self {
        let emission = profile.emission;
        let angle = emission.center + rng.gen_range(-emission.spread..emission.spread);
        let speed = rng.gen_range(MIN_SPEED..MAX_SPEED);
        let reach = emission.distance
            * (speed / REFERENCE_SPEED)
            * rng.gen_range(0.5..=1.0)
            * travel_scale;
        let turns = rng.gen_range(-MAX_TURNS..MAX_TURNS);
        let color = profile.palette[rng.gen_range(0..profile.palette.len())];
        let shape = ParticleShape::ALL[rng.gen_range(0..ParticleShape::ALL.len())];
        let size = rng.gen_range(SIZE_RANGE.0..SIZE_RANGE.1);

        Self {
            id,
            x: AnimatedValue::new(0.0),
            y: AnimatedValue::new(0.0),
            rotation: AnimatedValue::new(0.0),
            scale: AnimatedValue::new(0.0),
            opacity: AnimatedValue::new(0.0),
            color,
            shape,
            size,
            target: ParticleTarget {
                dx: angle.cos() * reach,
                dy: angle.sin() * reach,
                turns,
            },
        }
    }

    /// The motion carrying this particle through one burst of `duration`.
    pub fn motion(&self, curves: &CurveSet, duration: Duration) -> Motion {
        let mut channels: Vec<Motion> = vec![
            AnimationDescriptor::timing(&self.x, self.target.dx, duration)
                .easing(curves.travel)
                .native_driver(true)
                .into(),
            AnimationDescriptor::timing(&self.y, self.target.dy, duration)
                .easing(curves.travel)
                .native_driver(true)
                .into(),
        ];
        if let Some(spin) = curves.rotation {
            channels.push(
                AnimationDescriptor::timing(
                    &self.rotation,
                    self.target.turns * spin.multiplier,
                    duration,
                )
                .easing(spin.easing)
                .native_driver(true)
                .into(),
            );
        }
        channels.push(phases(&self.scale, &curves.scale, duration));
        channels.push(phases(&self.opacity, &curves.opacity, duration));
        Motion::Parallel(channels)
    }

    /// Renderer snapshot with the burst origin added back.
    pub fn drawable(&self, origin: (f32, f32)) -> ParticleDrawable {
        ParticleDrawable {
            shape: self.shape,
            x: origin.0 + self.x.get(),
            y: origin.1 + self.y.get(),
            rotation: self.rotation.get(),
            scale: self.scale.get(),
            opacity: self.opacity.get(),
            color: self.color,
            size: self.size,
        }
    }
}

fn phases(channel: &AnimatedValue, steps: &[PhaseSpec; 2], duration: Duration) -> Motion {
    Motion::sequence(steps.iter().map(|step| {
        AnimationDescriptor::timing(channel, step.to, scale_duration(duration, step.duration))
            .delay(scale_duration(duration, step.delay))
            .easing(step.easing)
            .native_driver(true)
    }))
}

/// What a renderer needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleDrawable {
    pub shape: ParticleShape,
    /// Absolute position.
    pub x: f32,
    pub y: f32,
    /// In turns.
    pub rotation: f32,
    pub scale: f32,
    pub opacity: f32,
    pub color: Rgb,
    pub size: f32,
}

impl ParticleDrawable {
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation * 360.0
    }
}
