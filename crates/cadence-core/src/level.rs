#![forbid(unsafe_code)]

//! Performance tiers.
//!
//! Defined here rather than in the budget crate because the settings store
//! carries an optional manual override of the tier.

use std::fmt;
use std::str::FromStr;

/// Discrete device-capability tier.
///
/// The ordering is significant: `High` < `Medium` < `Low` < `Critical` in
/// degradation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum PerformanceLevel {
    /// Full fidelity.
    #[default]
    High = 0,
    /// Reduced particle budget, batched starts.
    Medium = 1,
    /// No stagger, simplified curves.
    Low = 2,
    /// Emergency: no particles, single-member composites.
    Critical = 3,
}

impl PerformanceLevel {
    /// Every level, best first.
    pub const ALL: [Self; 4] = [Self::High, Self::Medium, Self::Low, Self::Critical];

    /// Move one step down.
    ///
    /// Returns `Critical` if already there.
    #[inline]
    pub fn next(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low | Self::Critical => Self::Critical,
        }
    }

    /// Whether automatic transitions stop here.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Critical
    }

    /// Lowercase name, as stored by the settings store.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }

    /// Steps below `High`.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not one of `high|medium|low|critical`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl ParseLevelError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown performance level: {:?}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for PerformanceLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError {
                input: s.to_owned(),
            })
    }
}

/// How the effective level is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelSelection {
    /// Follow frame-drop evidence.
    #[default]
    Auto,
    /// Hold this level; automatic transitions are suspended.
    Pinned(PerformanceLevel),
}

impl From<Option<PerformanceLevel>> for LevelSelection {
    fn from(level: Option<PerformanceLevel>) -> Self {
        level.map_or(Self::Auto, Self::Pinned)
    }
}

impl FromStr for LevelSelection {
    type Err = ParseLevelError;

    /// `auto` or a level name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Pinned)
        }
    }
}
