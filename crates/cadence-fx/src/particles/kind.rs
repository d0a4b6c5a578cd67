#![forbid(unsafe_code)]

//! Per-kind particle tables.
//!
//! Every [`ParticleKind`] maps to one static [`KindProfile`]: the color
//! palette, the emission cone, and two [`CurveSet`]s (full fidelity and the
//! simplified set used when the policy asks for simplified easing).
//!
//! Phase timings are fractions of the request duration, so a profile is
//! independent of how long a burst lasts.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_8, PI};
use std::fmt;
use std::str::FromStr;

use cadence_core::animation::{CubicBezier, Easing};

use super::request::RequestError;

// ---------------------------------------------------------------------------
// Colors and shapes
// ---------------------------------------------------------------------------

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// From a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Outline a renderer draws for one particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleShape {
    Circle,
    Square,
    Triangle,
}

impl ParticleShape {
    /// All shapes, drawn uniformly at generation.
    pub const ALL: [Self; 3] = [Self::Circle, Self::Square, Self::Triangle];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Triangle => "triangle",
        }
    }
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// One step of a scale or opacity phase sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpec {
    /// Channel value at the end of the step.
    pub to: f32,
    /// Step length as a fraction of the burst duration.
    pub duration: f32,
    /// Wait before the step, as a fraction of the burst duration.
    pub delay: f32,
    pub easing: Easing,
}

impl PhaseSpec {
    const fn new(to: f32, duration: f32, delay: f32, easing: Easing) -> Self {
        Self {
            to,
            duration,
            delay,
            easing,
        }
    }
}

/// Spin applied over the travel time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSpec {
    pub easing: Easing,
    /// Factor on the particle's random rotation target.
    pub multiplier: f32,
}

/// Curves for every channel of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSet {
    /// Curve for the x and y tweens.
    pub travel: Easing,
    /// Factor on the sampled travel distance.
    pub travel_scale: f32,
    /// `None` leaves the rotation channel at zero.
    pub rotation: Option<RotationSpec>,
    pub scale: [PhaseSpec; 2],
    pub opacity: [PhaseSpec; 2],
}

impl CurveSet {
    /// Whether every channel uses a linear curve.
    pub fn is_linear(&self) -> bool {
        self.travel.is_linear()
            && self.rotation.is_none_or(|r| r.easing.is_linear())
            && self
                .scale
                .iter()
                .chain(self.opacity.iter())
                .all(|p| p.easing.is_linear())
    }

    /// Longest channel as a fraction of the burst duration.
    pub fn span(&self) -> f32 {
        let phases = |steps: &[PhaseSpec; 2]| {
            steps
                .iter()
                .map(|p| p.delay + p.duration)
                .sum::<f32>()
        };
        phases(&self.scale).max(phases(&self.opacity)).max(1.0)
    }
}

/// Where particles fly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    /// Cone axis in radians (screen coordinates, y down; `-π/2` is up).
    pub center: f32,
    /// Half-width of the cone in radians; `π` covers the full circle.
    pub spread: f32,
    /// Nominal travel distance in points at the reference speed.
    pub distance: f32,
}

/// Everything that distinguishes one particle kind from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    pub palette: &'static [Rgb],
    pub emission: Emission,
    pub full: CurveSet,
    pub simplified: CurveSet,
}

impl KindProfile {
    /// The curve set for the given fidelity.
    pub fn curves(&self, simplified: bool) -> &CurveSet {
        if simplified {
            &self.simplified
        } else {
            &self.full
        }
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Particle effect flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Colorful pieces thrown upward.
    Confetti,
    /// Warm sparks in every direction.
    Explosion,
    /// Pale glints in a narrow upward cone.
    Sparkle,
}

impl ParticleKind {
    pub const ALL: [Self; 3] = [Self::Confetti, Self::Explosion, Self::Sparkle];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confetti => "confetti",
            Self::Explosion => "explosion",
            Self::Sparkle => "sparkle",
        }
    }

    /// The static table entry for this kind.
    pub fn profile(self) -> &'static KindProfile {
        match self {
            Self::Confetti => &CONFETTI,
            Self::Explosion => &EXPLOSION,
            Self::Sparkle => &SPARKLE,
        }
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticleKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RequestError::UnknownKind(s.to_owned()))
    }
}

const CONFETTI_CURVE: Easing = Easing::Bezier(CubicBezier::new(0.215, 0.61, 0.355, 1.0));
const SPARKLE_CURVE: Easing = Easing::Bezier(CubicBezier::new(0.25, 0.46, 0.45, 0.94));
const LINEAR: Easing = Easing::Linear;

static CONFETTI: KindProfile = KindProfile {
    palette: &[
        Rgb::hex(0xff4d4d),
        Rgb::hex(0x4d94ff),
        Rgb::hex(0x4dff4d),
        Rgb::hex(0xffff4d),
        Rgb::hex(0xff4dff),
        Rgb::hex(0x4dffff),
    ],
    emission: Emission {
        center: -FRAC_PI_2,
        spread: FRAC_PI_2,
        distance: 100.0,
    },
    full: CurveSet {
        travel: CONFETTI_CURVE,
        travel_scale: 1.0,
        rotation: Some(RotationSpec {
            easing: CONFETTI_CURVE,
            multiplier: 1.0,
        }),
        scale: [
            PhaseSpec::new(1.0, 0.2, 0.0, Easing::OutBack(1.5)),
            PhaseSpec::new(0.0, 0.8, 0.4, Easing::InCubic),
        ],
        opacity: [
            PhaseSpec::new(1.0, 0.1, 0.0, Easing::InOutQuad),
            PhaseSpec::new(0.0, 0.3, 0.6, Easing::InQuad),
        ],
    },
    // Confetti keeps its spin even when simplified.
    simplified: CurveSet {
        travel: LINEAR,
        travel_scale: 1.0,
        rotation: Some(RotationSpec {
            easing: LINEAR,
            multiplier: 1.0,
        }),
        scale: [
            PhaseSpec::new(1.0, 0.2, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.8, 0.4, LINEAR),
        ],
        opacity: [
            PhaseSpec::new(1.0, 0.1, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.3, 0.6, LINEAR),
        ],
    },
};

static EXPLOSION: KindProfile = KindProfile {
    palette: &[
        Rgb::hex(0xff6b4d),
        Rgb::hex(0xff894d),
        Rgb::hex(0xffaa4d),
        Rgb::hex(0xffd04d),
        Rgb::hex(0xffe74d),
    ],
    emission: Emission {
        center: 0.0,
        spread: PI,
        distance: 150.0,
    },
    full: CurveSet {
        travel: Easing::OutExpo,
        travel_scale: 1.0,
        rotation: Some(RotationSpec {
            easing: Easing::OutExpo,
            multiplier: 2.0,
        }),
        scale: [
            PhaseSpec::new(1.5, 0.3, 0.0, Easing::OutBack(1.2)),
            PhaseSpec::new(0.0, 0.7, 0.0, Easing::InCubic),
        ],
        opacity: [
            PhaseSpec::new(1.0, 0.2, 0.0, Easing::InOutQuad),
            PhaseSpec::new(0.0, 0.6, 0.2, Easing::InQuad),
        ],
    },
    simplified: CurveSet {
        travel: LINEAR,
        travel_scale: 1.0,
        rotation: None,
        scale: [
            PhaseSpec::new(1.0, 0.3, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.7, 0.0, LINEAR),
        ],
        opacity: [
            PhaseSpec::new(1.0, 0.2, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.6, 0.2, LINEAR),
        ],
    },
};

static SPARKLE: KindProfile = KindProfile {
    palette: &[
        Rgb::hex(0xffffff),
        Rgb::hex(0xf0f0f0),
        Rgb::hex(0xe0e0e0),
        Rgb::hex(0xffff99),
        Rgb::hex(0xffe0b3),
    ],
    emission: Emission {
        center: -FRAC_PI_2,
        spread: FRAC_PI_8,
        distance: 100.0,
    },
    full: CurveSet {
        travel: SPARKLE_CURVE,
        travel_scale: 0.7,
        rotation: Some(RotationSpec {
            easing: SPARKLE_CURVE,
            multiplier: 0.5,
        }),
        scale: [
            PhaseSpec::new(1.2, 0.2, 0.0, Easing::OutBack(1.5)),
            PhaseSpec::new(0.0, 0.8, 0.0, Easing::InCubic),
        ],
        opacity: [
            PhaseSpec::new(1.0, 0.2, 0.0, Easing::InOutQuad),
            PhaseSpec::new(0.0, 0.7, 0.1, Easing::InQuad),
        ],
    },
    simplified: CurveSet {
        travel: LINEAR,
        travel_scale: 0.7,
        rotation: None,
        scale: [
            PhaseSpec::new(0.8, 0.5, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.5, 0.0, LINEAR),
        ],
        opacity: [
            PhaseSpec::new(0.8, 0.3, 0.0, LINEAR),
            PhaseSpec::new(0.0, 0.7, 0.0, LINEAR),
        ],
    },
};
