//! Particle bursts under different tiers and accessibility settings.

use std::time::Duration;

use cadence_budget::{LevelSelection, PerformanceContext, PerformanceLevel, policy};
use cadence_core::accessibility::MotionPreferences;
use cadence_core::animation::{OnFinish, completion_slot};
use cadence_fx::{
    ParticleConfig, ParticleKind, ParticleOutcome, ParticlePhase, ParticleSystem,
    ParticleSystemRequest, ParticleTrigger,
};
use cadence_runtime::AnimationOrchestrator;
use proptest::prelude::*;

fn system_with(level: PerformanceLevel, prefs: MotionPreferences, seed: u64) -> ParticleSystem {
    let perf = PerformanceContext::default();
    perf.set_performance_level(LevelSelection::Pinned(level));
    let orch = AnimationOrchestrator::new(perf, prefs);
    ParticleSystem::new(orch, ParticleConfig::default().seed(seed))
}

fn system(level: PerformanceLevel) -> ParticleSystem {
    system_with(level, MotionPreferences::new(), 1)
}

fn request(kind: ParticleKind, count: i64) -> ParticleSystemRequest {
    ParticleSystemRequest::new(kind)
        .count(count)
        .origin(160.0, 240.0)
        .duration(Duration::from_millis(400))
}

#[test]
fn low_tier_caps_fifty_to_twenty() {
    let sys = system(PerformanceLevel::Low);
    let out = sys
        .trigger(&request(ParticleKind::Confetti, 50), OnFinish::none())
        .unwrap();
    assert!(out.is_started());
    assert_eq!(sys.particle_count(), 20);
}

#[test]
fn critical_tier_completes_synchronously_with_no_particles() {
    let sys = system(PerformanceLevel::Critical);
    let (slot, on_complete) = completion_slot();
    let out = sys
        .trigger(&request(ParticleKind::Explosion, 30), on_complete)
        .unwrap();
    assert!(matches!(out, ParticleTrigger::CompletedImmediately));
    assert_eq!(slot.fire_count(), 1);
    assert_eq!(sys.particle_count(), 0);
    assert_eq!(sys.phase(), ParticlePhase::Idle);
    assert_eq!(sys.last_outcome(), Some(ParticleOutcome::Completed));
}

#[test]
fn disabled_animations_complete_synchronously_at_any_tier() {
    let prefs = MotionPreferences::new();
    prefs.update(|s| s.set_app_animations_enabled(false));
    let sys = system_with(PerformanceLevel::High, prefs, 1);
    let (slot, on_complete) = completion_slot();
    let out = sys
        .trigger(&request(ParticleKind::Sparkle, 30), on_complete)
        .unwrap();
    assert!(matches!(out, ParticleTrigger::CompletedImmediately));
    assert_eq!(slot.fire_count(), 1);
    assert_eq!(sys.particle_count(), 0);
    assert!(sys.drawables().is_empty());
}

#[test]
fn retrigger_while_animating_is_ignored() {
    let sys = system(PerformanceLevel::High);
    let (first, on_first) = completion_slot();
    let (second, on_second) = completion_slot();

    sys.trigger(&request(ParticleKind::Confetti, 10), on_first)
        .unwrap();
    let out = sys
        .trigger(&request(ParticleKind::Explosion, 40), on_second)
        .unwrap();
    assert!(out.is_ignored());
    assert!(!out.cancel());
    assert_eq!(sys.particle_count(), 10);
    assert_eq!(sys.kind(), Some(ParticleKind::Confetti));

    for _ in 0..60 {
        sys.orchestrator().tick(Duration::from_millis(16));
    }
    assert_eq!(first.fire_count(), 1);
    assert!(!second.is_fired());
    assert_eq!(sys.phase(), ParticlePhase::Idle);
}

#[test]
fn cancel_stops_every_particle_and_drops_callback() {
    let sys = system(PerformanceLevel::High);
    let (slot, on_complete) = completion_slot();
    let out = sys
        .trigger(&request(ParticleKind::Explosion, 8), on_complete)
        .unwrap();
    sys.orchestrator().tick(Duration::from_millis(100));
    assert!(out.cancel());
    assert!(!out.cancel());
    assert_eq!(sys.particle_count(), 0);
    assert_eq!(sys.orchestrator().active_count(), 0);

    sys.orchestrator().tick(Duration::from_secs(5));
    assert!(!slot.is_fired());
    assert_eq!(sys.last_outcome(), Some(ParticleOutcome::Cancelled));

    // The instance accepts new bursts after a cancel.
    let again = sys
        .trigger(&request(ParticleKind::Sparkle, 3), OnFinish::none())
        .unwrap();
    assert!(again.is_started());
}

#[test]
fn stale_run_cannot_cancel_next_generation() {
    let sys = system(PerformanceLevel::High);
    let first = sys
        .trigger(&request(ParticleKind::Sparkle, 2), OnFinish::none())
        .unwrap();
    sys.orchestrator().tick(Duration::from_secs(2));
    assert_eq!(sys.phase(), ParticlePhase::Idle);

    sys.trigger(&request(ParticleKind::Sparkle, 2), OnFinish::none())
        .unwrap();
    assert!(!first.cancel());
    assert_eq!(sys.phase(), ParticlePhase::Animating);
}

#[test]
fn same_seed_gives_same_burst() {
    let a = system_with(PerformanceLevel::High, MotionPreferences::new(), 1234);
    let b = system_with(PerformanceLevel::High, MotionPreferences::new(), 1234);
    for sys in [&a, &b] {
        sys.trigger(&request(ParticleKind::Confetti, 12), OnFinish::none())
            .unwrap();
        sys.orchestrator().tick(Duration::from_millis(150));
    }
    assert_eq!(a.drawables(), b.drawables());
}

#[test]
fn low_tier_explosion_does_not_spin() {
    let sys = system(PerformanceLevel::Low);
    sys.trigger(&request(ParticleKind::Explosion, 5), OnFinish::none())
        .unwrap();
    // Low batches starts: the first tick begins the run, the next advances it.
    sys.orchestrator().tick(Duration::ZERO);
    sys.orchestrator().tick(Duration::from_millis(200));
    let drawables = sys.drawables();
    assert_eq!(drawables.len(), 5);
    assert!(drawables.iter().all(|d| d.rotation == 0.0));
    assert!(drawables.iter().any(|d| d.x != 160.0 || d.y != 240.0));
}

#[test]
fn reduce_motion_halves_burst_length() {
    let prefs = MotionPreferences::new();
    prefs.set_platform_reduce_motion(true);
    let sys = system_with(PerformanceLevel::High, prefs, 1);
    let (slot, on_complete) = completion_slot();
    sys.trigger(&request(ParticleKind::Sparkle, 4), on_complete)
        .unwrap();
    // Stagger 20ms and 400ms per particle, both halved: 3 * 10 + 200.
    sys.orchestrator().tick(Duration::from_millis(229));
    assert!(!slot.is_fired());
    sys.orchestrator().tick(Duration::from_millis(1));
    assert_eq!(slot.fire_count(), 1);
}

#[test]
fn medium_tier_waits_for_interactions() {
    let sys = system(PerformanceLevel::Medium);
    let orch = sys.orchestrator().clone();
    orch.begin_interaction();
    let (slot, on_complete) = completion_slot();
    sys.trigger(&request(ParticleKind::Confetti, 2), on_complete)
        .unwrap();
    for _ in 0..10 {
        orch.tick(Duration::from_millis(100));
    }
    assert!(!slot.is_fired());
    assert!(sys.drawables().iter().all(|d| d.opacity == 0.0));

    orch.end_interaction();
    for _ in 0..20 {
        orch.tick(Duration::from_millis(100));
    }
    assert_eq!(slot.fire_count(), 1);
}

#[test]
fn finished_burst_ends_on_targets() {
    let sys = system(PerformanceLevel::High);
    let (slot, on_complete) = completion_slot();
    sys.trigger(&request(ParticleKind::Confetti, 3), on_complete)
        .unwrap();
    // Confetti shrinks until 1.4x the burst duration; the third particle
    // starts 40ms late.
    sys.orchestrator().tick(Duration::from_millis(599));
    assert_eq!(sys.particle_count(), 3);
    assert!(!slot.is_fired());
    sys.orchestrator().tick(Duration::from_millis(1));
    assert!(slot.is_fired());
    assert!(sys.drawables().is_empty());
}

proptest! {
    #[test]
    fn particle_count_never_exceeds_policy(
        level in 0usize..4,
        requested in 0i64..500,
        kind in 0usize..3,
    ) {
        let level = PerformanceLevel::ALL[level];
        let sys = system(level);
        let out = sys
            .trigger(&request(ParticleKind::ALL[kind], requested), OnFinish::none())
            .unwrap();
        let cap = policy(level).max_particle_count as usize;
        prop_assert!(sys.particle_count() <= cap);
        prop_assert_eq!(sys.particle_count(), (requested as usize).min(cap));
        prop_assert_eq!(out.is_started(), sys.particle_count() > 0);
    }
}
