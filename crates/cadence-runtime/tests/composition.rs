//! Orchestrator contracts across composition modes and tiers.

use std::time::Duration;

use cadence_budget::{LevelSelection, PerformanceContext, PerformanceLevel};
use cadence_core::accessibility::MotionPreferences;
use cadence_core::animation::{
    AnimatedValue, AnimationDescriptor, Easing, Motion, MotionEvent, OnFinish, SpringConfig,
    completion_slot,
};
use cadence_runtime::{AnimationOrchestrator, CompositionMode, RunStatus};
use proptest::prelude::*;

const MS_100: Duration = Duration::from_millis(100);

fn orchestrator() -> AnimationOrchestrator {
    AnimationOrchestrator::new(PerformanceContext::default(), MotionPreferences::new())
}

fn step(v: &AnimatedValue, to: f32, label: &str) -> Motion {
    AnimationDescriptor::timing(v, to, MS_100)
        .easing(Easing::Linear)
        .label(label)
        .into()
}

fn started(events: &[MotionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            MotionEvent::Started(l) => Some(l.to_string()),
            MotionEvent::Finished(_) => None,
        })
        .collect()
}

fn finished(events: &[MotionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            MotionEvent::Finished(l) => Some(l.to_string()),
            MotionEvent::Started(_) => None,
        })
        .collect()
}

#[test]
fn stopping_a_sequence_mid_step_halts_everything_after() {
    let orch = orchestrator();
    let v = AnimatedValue::new(0.0);
    let handle = orch.run_animation(
        vec![step(&v, 1.0, "A"), step(&v, 2.0, "B"), step(&v, 3.0, "C")],
        CompositionMode::Sequence,
    );
    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);

    orch.tick(Duration::from_millis(150));
    handle.stop();
    for _ in 0..10 {
        orch.tick(MS_100);
    }

    let events = orch.drain_events();
    assert_eq!(started(&events), ["A", "B"]);
    assert_eq!(finished(&events), ["A"]);
    assert!(!slot.is_fired());
    assert_eq!(handle.status(), RunStatus::Stopped);
    assert!(v.get() > 1.0 && v.get() < 2.0);
}

#[test]
fn stagger_starts_members_in_order_at_offsets() {
    let orch = orchestrator();
    let vals: Vec<_> = (0..3).map(|_| AnimatedValue::new(0.0)).collect();
    let members = vals
        .iter()
        .enumerate()
        .map(|(i, v)| step(v, 1.0, &format!("m{i}")))
        .collect();
    let handle = orch.run_animation(members, CompositionMode::Stagger(Duration::from_millis(50)));
    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);

    orch.tick(Duration::from_millis(60));
    assert_eq!(started(&orch.drain_events()), ["m0", "m1"]);
    orch.tick(Duration::from_millis(60));
    assert_eq!(started(&orch.drain_events()), ["m2"]);

    // Last member starts at 100ms and ends at 200ms.
    orch.tick(Duration::from_millis(79));
    assert!(!slot.is_fired());
    orch.tick(Duration::from_millis(1));
    assert_eq!(slot.fire_count(), 1);
}

#[test]
fn low_tier_runs_stagger_as_parallel() {
    let orch = orchestrator();
    orch.performance()
        .set_performance_level(LevelSelection::Pinned(PerformanceLevel::Low));
    let a = AnimatedValue::new(0.0);
    let b = AnimatedValue::new(0.0);
    let handle = orch.run_animation(
        vec![step(&a, 1.0, "a"), step(&b, 1.0, "b")],
        CompositionMode::Stagger(Duration::from_millis(500)),
    );
    handle.start(OnFinish::none());
    orch.tick(Duration::ZERO);
    assert_eq!(started(&orch.drain_events()), ["a", "b"]);
    orch.tick(MS_100);
    assert_eq!(handle.status(), RunStatus::Completed);
}

#[test]
fn tier_change_after_start_does_not_reconfigure_run() {
    let orch = orchestrator();
    let a = AnimatedValue::new(0.0);
    let b = AnimatedValue::new(0.0);
    let handle = orch.run_animation(
        vec![step(&a, 1.0, "a"), step(&b, 1.0, "b")],
        CompositionMode::Parallel,
    );
    handle.start(OnFinish::none());
    orch.performance()
        .set_performance_level(LevelSelection::Pinned(PerformanceLevel::Critical));
    orch.tick(MS_100);
    assert_eq!(a.get(), 1.0);
    assert_eq!(b.get(), 1.0);
}

#[test]
fn nested_composites_finish_once() {
    let orch = orchestrator();
    let x = AnimatedValue::new(0.0);
    let y = AnimatedValue::new(0.0);
    let handle = orch.run_animation(
        vec![
            Motion::sequence([step(&x, 1.0, "x1"), step(&x, 0.0, "x2")]),
            Motion::stagger(MS_100, [step(&y, 1.0, "y1"), step(&y, 2.0, "y2")]),
        ],
        CompositionMode::Parallel,
    );
    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);
    for _ in 0..10 {
        orch.tick(Duration::from_millis(25));
    }
    assert_eq!(slot.fire_count(), 1);
    assert_eq!(x.get(), 0.0);
    assert_eq!(y.get(), 2.0);
}

fn frames_until_finished(orch: &AnimationOrchestrator, motion: Motion) -> usize {
    let handle = orch.run(motion);
    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);
    let mut frames = 0;
    while !slot.is_fired() && frames < 1_000 {
        orch.tick(Duration::from_millis(16));
        frames += 1;
    }
    frames
}

#[test]
fn spring_step_hands_over_to_next_step() {
    let orch = orchestrator();
    let a = AnimatedValue::new(0.0);
    let b = AnimatedValue::new(0.0);
    let handle = orch.run_animation(
        vec![
            Motion::from(
                AnimationDescriptor::spring(&a, 1.0, SpringConfig::default()).label("settle"),
            ),
            step(&b, 1.0, "after"),
        ],
        CompositionMode::Sequence,
    );
    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);

    let mut seen = Vec::new();
    for _ in 0..120 {
        orch.tick(Duration::from_millis(16));
        seen.extend(orch.drain_events());
    }
    assert_eq!(slot.fire_count(), 1);
    assert_eq!((a.get(), b.get()), (1.0, 1.0));
    assert_eq!(started(&seen), ["settle", "after"]);
    assert_eq!(finished(&seen), ["settle", "after"]);
}

#[test]
fn disabled_animations_jump_springs_to_target() {
    let orch = orchestrator();
    orch.preferences()
        .update(|s| s.set_app_animations_enabled(false));
    let v = AnimatedValue::new(0.0);
    let handle = orch.run(AnimationDescriptor::spring(&v, 4.0, SpringConfig::default()));
    assert!(handle.is_suppressed());
    assert_eq!(v.get(), 4.0);

    let (slot, on_finish) = completion_slot();
    handle.start(on_finish);
    assert_eq!(slot.fire_count(), 1);
}

#[test]
fn reduce_motion_springs_settle_sooner_without_bounce() {
    let full = orchestrator();
    let v = AnimatedValue::new(0.0);
    let full_frames = frames_until_finished(
        &full,
        Motion::from(AnimationDescriptor::spring(&v, 1.0, SpringConfig::default())),
    );
    assert_eq!(v.get(), 1.0);

    let reduced = orchestrator();
    reduced.preferences().set_platform_reduce_motion(true);
    let w = AnimatedValue::new(0.0);
    let handle = reduced.run(AnimationDescriptor::spring(&w, 1.0, SpringConfig::default()));
    handle.start(OnFinish::none());
    let mut peak = 0.0_f32;
    let mut reduced_frames = 0;
    while handle.is_running() && reduced_frames < 1_000 {
        reduced.tick(Duration::from_millis(16));
        peak = peak.max(w.get());
        reduced_frames += 1;
    }
    assert_eq!(w.get(), 1.0);
    assert!(peak <= 1.0);
    assert!(reduced_frames < full_frames, "{reduced_frames} vs {full_frames}");
}

proptest! {
    #[test]
    fn finish_fires_at_most_once(
        ticks in prop::collection::vec(0u64..80, 1..40),
        stop_at in prop::option::of(0usize..40),
    ) {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run_animation(
            vec![step(&v, 1.0, "a"), step(&v, 2.0, "b")],
            CompositionMode::Sequence,
        );
        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);

        let mut stopped_early = false;
        for (i, ms) in ticks.iter().enumerate() {
            if stop_at == Some(i) {
                stopped_early = handle.is_running();
                handle.stop();
                handle.stop();
            }
            orch.tick(Duration::from_millis(*ms));
        }
        prop_assert!(slot.fire_count() <= 1);
        if stopped_early {
            prop_assert_eq!(slot.fire_count(), 0);
        }
        let total: u64 = ticks.iter().sum();
        if stop_at.is_none() && total >= 200 {
            prop_assert_eq!(slot.fire_count(), 1);
            prop_assert_eq!(v.get(), 2.0);
        }
    }
}
