#![forbid(unsafe_code)]

//! Tier → fidelity policy.
//!
//! One static record per [`PerformanceLevel`]:
//!
//! | level    | max particles | stagger | batch | simplified easing |
//! |----------|--------------:|:-------:|:-----:|:-----------------:|
//! | High     | 100           | yes     | no    | no                |
//! | Medium   | 50            | yes     | yes   | no                |
//! | Low      | 20            | no      | yes   | yes               |
//! | Critical | 0             | no      | yes   | yes               |
//!
//! Pure and side-effect free.

use cadence_core::level::PerformanceLevel;

/// Animation fidelity allowed at one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceConfig {
    /// The tier this record belongs to.
    pub level: PerformanceLevel,
    /// Upper bound on particles per trigger.
    pub max_particle_count: u32,
    /// Whether staggered composites keep their gaps (else run as parallel).
    pub use_stagger: bool,
    /// Whether starts wait for pending interactions to settle.
    pub batch: bool,
    /// Whether effects use linear curves and drop secondary channels.
    pub simplified_easing: bool,
}

impl PerformanceConfig {
    /// `min(requested, max_particle_count)`.
    #[inline]
    pub fn effective_count(&self, requested: u32) -> u32 {
        requested.min(self.max_particle_count)
    }

    /// Whether parallel and staggered composites keep only their first member.
    #[inline]
    pub fn single_member_only(&self) -> bool {
        self.level.is_terminal()
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        policy(PerformanceLevel::default())
    }
}

const TABLE: [PerformanceConfig; 4] = [
    PerformanceConfig {
        level: PerformanceLevel::High,
        max_particle_count: 100,
        use_stagger: true,
        batch: false,
        simplified_easing: false,
    },
    PerformanceConfig {
        level: PerformanceLevel::Medium,
        max_particle_count: 50,
        use_stagger: true,
        batch: true,
        simplified_easing: false,
    },
    PerformanceConfig {
        level: PerformanceLevel::Low,
        max_particle_count: 20,
        use_stagger: false,
        batch: true,
        simplified_easing: true,
    },
    PerformanceConfig {
        level: PerformanceLevel::Critical,
        max_particle_count: 0,
        use_stagger: false,
        batch: true,
        simplified_easing: true,
    },
];

/// Look up the fidelity record for `level`.
#[inline]
pub const fn policy(level: PerformanceLevel) -> PerformanceConfig {
    TABLE[level as usize]
}
