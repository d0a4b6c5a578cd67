#![forbid(unsafe_code)]

//! Trigger requests and their validation.
//!
//! A [`ParticleSystemRequest`] carries caller input as given (signed count,
//! raw coordinates). [`validate`](ParticleSystemRequest::validate) turns it
//! into the checked form the engine works with, or a [`RequestError`].
//!
//! # Failure Modes
//!
//! | input                          | error                          |
//! |--------------------------------|--------------------------------|
//! | count below zero               | [`RequestError::NegativeCount`] |
//! | kind name not in the table     | [`RequestError::UnknownKind`]  |
//! | zero, negative or NaN duration | [`RequestError::InvalidDuration`] |
//! | non-finite origin coordinate   | [`RequestError::InvalidOrigin`] |

use std::fmt;
use std::time::Duration;

use super::kind::ParticleKind;

/// Malformed trigger input.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The requested particle count was below zero.
    NegativeCount(i64),
    /// The kind name matched no [`ParticleKind`].
    UnknownKind(String),
    /// The duration was zero, negative or not a number (milliseconds).
    InvalidDuration(f64),
    /// An origin coordinate was NaN or infinite.
    InvalidOrigin { x: f32, y: f32 },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeCount(n) => write!(f, "particle count must not be negative (got {n})"),
            Self::UnknownKind(name) => write!(f, "unknown particle kind: {name:?}"),
            Self::InvalidDuration(ms) => write!(f, "invalid particle duration: {ms} ms"),
            Self::InvalidOrigin { x, y } => write!(f, "invalid particle origin: ({x}, {y})"),
        }
    }
}

impl std::error::Error for RequestError {}

/// One burst as asked for by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystemRequest {
    pub kind: ParticleKind,
    /// Particles wanted before the policy cap.
    pub requested_count: i64,
    pub origin_x: f32,
    pub origin_y: f32,
    pub duration: Duration,
}

impl ParticleSystemRequest {
    /// A burst of `kind` at the origin with the default count and duration.
    pub fn new(kind: ParticleKind) -> Self {
        Self {
            kind,
            requested_count: i64::from(super::DEFAULT_PARTICLE_COUNT),
            origin_x: 0.0,
            origin_y: 0.0,
            duration: super::DEFAULT_DURATION,
        }
    }

    /// Build a request from loosely typed input (kind name, millisecond
    /// duration), failing fast on anything malformed.
    pub fn parse(
        kind: &str,
        requested_count: i64,
        origin_x: f32,
        origin_y: f32,
        duration_ms: f64,
    ) -> Result<Self, RequestError> {
        let kind = kind.parse::<ParticleKind>()?;
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(RequestError::InvalidDuration(duration_ms));
        }
        let request = Self {
            kind,
            requested_count,
            origin_x,
            origin_y,
            duration: Duration::from_nanos((duration_ms * 1_000_000.0).round() as u64),
        };
        request.validate()?;
        Ok(request)
    }

    /// Set the requested count (builder).
    #[must_use]
    pub fn count(mut self, requested_count: i64) -> Self {
        self.requested_count = requested_count;
        self
    }

    /// Set the origin (builder).
    #[must_use]
    pub fn origin(mut self, x: f32, y: f32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Set the burst duration (builder).
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check the request.
    pub fn validate(&self) -> Result<ValidRequest, RequestError> {
        if self.requested_count < 0 {
            return Err(RequestError::NegativeCount(self.requested_count));
        }
        let count = u32::try_from(self.requested_count).unwrap_or(u32::MAX);
        if self.duration.is_zero() {
            return Err(RequestError::InvalidDuration(0.0));
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(RequestError::InvalidOrigin {
                x: self.origin_x,
                y: self.origin_y,
            });
        }
        Ok(ValidRequest {
            kind: self.kind,
            count,
            origin: (self.origin_x, self.origin_y),
            duration: self.duration,
        })
    }
}

/// A request that passed [`validate`](ParticleSystemRequest::validate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRequest {
    pub kind: ParticleKind,
    /// Requested count, saturated to `u32`.
    pub count: u32,
    pub origin: (f32, f32),
    pub duration: Duration,
}
