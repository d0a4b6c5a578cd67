#![forbid(unsafe_code)]

//! Animation orchestrator.
//!
//! Turns a list of [`Motion`] members plus a [`CompositionMode`] into an
//! [`AnimationHandle`] with a uniform `start` / `stop` / finish contract.
//!
//! # How it works
//!
//! 1. `run_animation()` registers the request. If animations are disabled
//!    the request becomes [`AnimationHandle::Suppressed`]: target values are
//!    written at once and `start()` completes synchronously.
//! 2. `start()` snapshots the performance policy and accessibility options,
//!    composes the members accordingly, and either begins the run or queues
//!    it behind pending interactions (policy `batch` flag).
//! 3. `tick(dt)` flushes queued starts when no interaction is pending,
//!    advances every running composite, and fires finish callbacks after
//!    internal state is released.
//!
//! # Invariants
//!
//! 1. A finish callback fires at most once per `start()`, and only on
//!    natural completion. `stop()` (or a restart) drops it unfired.
//! 2. `stop()` is idempotent.
//! 3. A run never observes policy or accessibility changes made after its
//!    `start()`.
//! 4. At the terminal tier, parallel and staggered requests with several
//!    members run only the first. Staggers run as parallel when the policy
//!    disables stagger.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use cadence_budget::{PerformanceConfig, PerformanceContext};
use cadence_core::accessibility::MotionPreferences;
use cadence_core::animation::{FinishStatus, Motion, MotionEvent, MotionRun, OnFinish};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the members of a request are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionMode {
    /// One member (extra members run alongside it).
    Single,
    /// All members on one timeline.
    Parallel,
    /// Members one after another.
    Sequence,
    /// Members started the given gap apart.
    Stagger(Duration),
}

impl CompositionMode {
    /// Name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Parallel => "parallel",
            Self::Sequence => "sequence",
            Self::Stagger(_) => "stagger",
        }
    }
}

/// Lifecycle of one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Never started.
    Idle,
    /// Started; waiting for pending interactions to settle.
    Deferred,
    /// Advancing on every tick.
    Running,
    /// Reached its end; the finish callback fired.
    Completed,
    /// Stopped before its end.
    Stopped,
}

impl RunStatus {
    /// Whether a run is in flight (deferred or running).
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Deferred | Self::Running)
    }

    /// Terminal outcome, if any.
    pub fn outcome(self) -> Option<FinishStatus> {
        match self {
            Self::Completed => Some(FinishStatus::Completed),
            Self::Stopped => Some(FinishStatus::Stopped),
            Self::Idle | Self::Deferred | Self::Running => None,
        }
    }
}

/// Combine `members` per `mode` under `config`.
pub fn compose(members: &[Motion], mode: CompositionMode, config: &PerformanceConfig) -> Motion {
    let truncate = config.single_member_only()
        && members.len() > 1
        && matches!(mode, CompositionMode::Parallel | CompositionMode::Stagger(_));
    let mut members: Vec<Motion> = if truncate {
        members[..1].to_vec()
    } else {
        members.to_vec()
    };
    match mode {
        CompositionMode::Single => {
            if members.len() == 1
                && let Some(only) = members.pop()
            {
                return only;
            }
            Motion::Parallel(members)
        }
        CompositionMode::Parallel => Motion::Parallel(members),
        CompositionMode::Sequence => Motion::Sequence(members),
        CompositionMode::Stagger(delay) if config.use_stagger => Motion::Stagger { delay, members },
        CompositionMode::Stagger(_) => Motion::Parallel(members),
    }
}

// ---------------------------------------------------------------------------
// Engine state
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Phase {
    Idle,
    Deferred { motion: Motion, on_finish: OnFinish },
    Running { run: MotionRun, on_finish: OnFinish },
    Completed,
    Stopped,
}

impl Phase {
    fn status(&self) -> RunStatus {
        match self {
            Self::Idle => RunStatus::Idle,
            Self::Deferred { .. } => RunStatus::Deferred,
            Self::Running { .. } => RunStatus::Running,
            Self::Completed => RunStatus::Completed,
            Self::Stopped => RunStatus::Stopped,
        }
    }
}

#[derive(Debug)]
struct Slot {
    members: Vec<Motion>,
    mode: CompositionMode,
    phase: Phase,
    detached: bool,
}

#[derive(Debug, Default)]
struct Engine {
    slots: BTreeMap<u64, Slot>,
    next_id: u64,
    pending_interactions: u32,
    events: Vec<MotionEvent>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns every animation run and advances them on `tick()`.
///
/// Cloning yields another handle to the same orchestrator.
#[derive(Clone)]
pub struct AnimationOrchestrator {
    perf: PerformanceContext,
    prefs: MotionPreferences,
    engine: Rc<RefCell<Engine>>,
}

impl AnimationOrchestrator {
    /// Create an orchestrator reading policy from `perf` and options from
    /// `prefs`.
    pub fn new(perf: PerformanceContext, prefs: MotionPreferences) -> Self {
        Self {
            perf,
            prefs,
            engine: Rc::new(RefCell::new(Engine::default())),
        }
    }

    /// The performance context in use.
    pub fn performance(&self) -> &PerformanceContext {
        &self.perf
    }

    /// The accessibility preferences in use.
    pub fn preferences(&self) -> &MotionPreferences {
        &self.prefs
    }

    /// Register a composite animation. Call `start()` on the handle to run it.
    pub fn run_animation(&self, members: Vec<Motion>, mode: CompositionMode) -> AnimationHandle {
        if !self.prefs.options().animations_enabled {
            trace!(mode = mode.as_str(), "animations disabled; suppressing");
            return AnimationHandle::Suppressed(SuppressedAnimation::new(members));
        }
        let mut engine = self.engine.borrow_mut();
        let id = engine.next_id;
        engine.next_id = engine.next_id.wrapping_add(1);
        engine.slots.insert(
            id,
            Slot {
                members,
                mode,
                phase: Phase::Idle,
                detached: false,
            },
        );
        AnimationHandle::Real(RealAnimation {
            orchestrator: self.clone(),
            id,
        })
    }

    /// Register a single animation.
    pub fn run(&self, motion: impl Into<Motion>) -> AnimationHandle {
        self.run_animation(vec![motion.into()], CompositionMode::Single)
    }

    /// Advance every run by `dt`. Returns how many finished during this tick.
    pub fn tick(&self, dt: Duration) -> usize {
        let finished = {
            let mut engine = self.engine.borrow_mut();
            let Engine {
                slots,
                pending_interactions,
                events,
                ..
            } = &mut *engine;
            let flush = *pending_interactions == 0;
            let mut finished = Vec::new();
            let mut released = Vec::new();

            for (id, slot) in slots.iter_mut() {
                slot.phase = match std::mem::replace(&mut slot.phase, Phase::Idle) {
                    Phase::Deferred { motion, on_finish } if flush => {
                        let mut run = MotionRun::new(motion);
                        run.begin(events);
                        Phase::Running { run, on_finish }
                    }
                    Phase::Running { mut run, on_finish } => {
                        if run.tick(dt, events) {
                            finished.push(on_finish);
                            if slot.detached {
                                released.push(*id);
                            }
                            Phase::Completed
                        } else {
                            Phase::Running { run, on_finish }
                        }
                    }
                    other => other,
                };
            }
            for id in released {
                slots.remove(&id);
            }
            finished
        };

        let count = finished.len();
        for on_finish in finished {
            on_finish.fire(FinishStatus::Completed);
        }
        count
    }

    /// An interaction (gesture, transition) began; batched starts wait.
    pub fn begin_interaction(&self) {
        let mut engine = self.engine.borrow_mut();
        engine.pending_interactions = engine.pending_interactions.saturating_add(1);
    }

    /// An interaction ended.
    pub fn end_interaction(&self) {
        let mut engine = self.engine.borrow_mut();
        engine.pending_interactions = engine.pending_interactions.saturating_sub(1);
    }

    /// Interactions currently pending.
    pub fn pending_interactions(&self) -> u32 {
        self.engine.borrow().pending_interactions
    }

    /// Runs currently deferred or running.
    pub fn active_count(&self) -> usize {
        self.engine
            .borrow()
            .slots
            .values()
            .filter(|slot| slot.phase.status().is_active())
            .count()
    }

    /// Stop every run in flight. No callbacks fire.
    pub fn stop_all(&self) {
        let dropped: Vec<Phase> = {
            let mut engine = self.engine.borrow_mut();
            let mut dropped = Vec::new();
            engine.slots.retain(|_, slot| {
                if slot.phase.status().is_active() {
                    dropped.push(std::mem::replace(&mut slot.phase, Phase::Stopped));
                }
                !slot.detached
            });
            dropped
        };
        drop(dropped);
    }

    /// Take queued lifecycle events, oldest first.
    pub fn drain_events(&self) -> Vec<MotionEvent> {
        std::mem::take(&mut self.engine.borrow_mut().events)
    }

    fn status_of(&self, id: u64) -> RunStatus {
        self.engine
            .borrow()
            .slots
            .get(&id)
            .map_or(RunStatus::Idle, |slot| slot.phase.status())
    }

    fn start(&self, id: u64, on_finish: OnFinish) {
        let config = self.perf.config();
        let opts = self.prefs.options();

        let (previous, suppressed) = {
            let mut engine = self.engine.borrow_mut();
            let Engine { slots, events, .. } = &mut *engine;
            let Some(slot) = slots.get_mut(&id) else {
                return;
            };
            if slot.phase.status().is_active() {
                debug!(mode = slot.mode.as_str(), "restarting animation in flight");
            }
            let motion = opts.adapt(&compose(&slot.members, slot.mode, &config));

            if !opts.animations_enabled {
                let previous = std::mem::replace(&mut slot.phase, Phase::Completed);
                (previous, Some((motion, on_finish)))
            } else if config.batch {
                trace!(mode = slot.mode.as_str(), "start deferred until interactions settle");
                let previous =
                    std::mem::replace(&mut slot.phase, Phase::Deferred { motion, on_finish });
                (previous, None)
            } else {
                let mut run = MotionRun::new(motion);
                run.begin(events);
                let previous = std::mem::replace(&mut slot.phase, Phase::Running { run, on_finish });
                (previous, None)
            }
        };

        drop(previous);
        if let Some((motion, on_finish)) = suppressed {
            motion.apply_final_values();
            on_finish.fire(FinishStatus::Completed);
        }
    }

    fn stop(&self, id: u64) {
        let previous = {
            let mut engine = self.engine.borrow_mut();
            engine.slots.get_mut(&id).and_then(|slot| {
                slot.phase
                    .status()
                    .is_active()
                    .then(|| std::mem::replace(&mut slot.phase, Phase::Stopped))
            })
        };
        drop(previous);
    }

    fn release(&self, id: u64) {
        // A handle dropped from inside a borrow leaves its slot behind;
        // `stop_all` or completion reclaims it.
        let Ok(mut engine) = self.engine.try_borrow_mut() else {
            return;
        };
        let remove = match engine.slots.get_mut(&id) {
            Some(slot) if slot.phase.status().is_active() => {
                slot.detached = true;
                false
            }
            Some(_) => true,
            None => false,
        };
        let removed = if remove { engine.slots.remove(&id) } else { None };
        drop(engine);
        drop(removed);
    }
}

impl fmt::Debug for AnimationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.engine.borrow();
        f.debug_struct("AnimationOrchestrator")
            .field("slots", &engine.slots.len())
            .field("pending_interactions", &engine.pending_interactions)
            .field("queued_events", &engine.events.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to an animation owned by an [`AnimationOrchestrator`].
///
/// Dropping the handle does not stop the animation.
#[derive(Debug)]
pub struct RealAnimation {
    orchestrator: AnimationOrchestrator,
    id: u64,
}

impl RealAnimation {
    /// Start (or restart) the animation.
    pub fn start(&self, on_finish: OnFinish) {
        self.orchestrator.start(self.id, on_finish);
    }

    /// Stop the animation; its finish callback never fires.
    pub fn stop(&self) {
        self.orchestrator.stop(self.id);
    }

    /// Current status.
    pub fn status(&self) -> RunStatus {
        self.orchestrator.status_of(self.id)
    }
}

impl Drop for RealAnimation {
    fn drop(&mut self) {
        self.orchestrator.release(self.id);
    }
}

/// Stand-in used while animations are disabled.
///
/// Writes every target value when created and again on `start()`, then
/// reports completion synchronously.
#[derive(Debug)]
pub struct SuppressedAnimation {
    members: Vec<Motion>,
    status: Cell<RunStatus>,
}

impl SuppressedAnimation {
    fn new(members: Vec<Motion>) -> Self {
        for m in &members {
            m.apply_final_values();
        }
        Self {
            members,
            status: Cell::new(RunStatus::Idle),
        }
    }

    /// Apply the targets and fire `on_finish` before returning.
    pub fn start(&self, on_finish: OnFinish) {
        for m in &self.members {
            m.apply_final_values();
        }
        self.status.set(RunStatus::Completed);
        on_finish.fire(FinishStatus::Completed);
    }

    /// No-op.
    pub fn stop(&self) {}

    /// `Idle` before `start()`, `Completed` after.
    pub fn status(&self) -> RunStatus {
        self.status.get()
    }
}

/// A started-or-startable animation.
#[derive(Debug)]
pub enum AnimationHandle {
    /// Driven by the orchestrator's tick.
    Real(RealAnimation),
    /// Animations are disabled; completes immediately.
    Suppressed(SuppressedAnimation),
}

impl AnimationHandle {
    /// Start the animation; `on_finish` fires once on natural completion.
    pub fn start(&self, on_finish: OnFinish) {
        match self {
            Self::Real(a) => a.start(on_finish),
            Self::Suppressed(a) => a.start(on_finish),
        }
    }

    /// Stop the animation. Idempotent.
    pub fn stop(&self) {
        match self {
            Self::Real(a) => a.stop(),
            Self::Suppressed(a) => a.stop(),
        }
    }

    /// Whether the animation is deferred or running.
    pub fn is_running(&self) -> bool {
        self.status().is_active()
    }

    /// Current status.
    pub fn status(&self) -> RunStatus {
        match self {
            Self::Real(a) => a.status(),
            Self::Suppressed(a) => a.status(),
        }
    }

    /// Whether this is the suppressed stand-in.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_budget::{LevelSelection, PerformanceLevel, policy};
    use cadence_core::animation::{AnimatedValue, AnimationDescriptor, Easing, completion_slot};

    const MS_100: Duration = Duration::from_millis(100);

    fn orchestrator() -> AnimationOrchestrator {
        AnimationOrchestrator::new(PerformanceContext::default(), MotionPreferences::new())
    }

    fn tween(v: &AnimatedValue, to: f32, label: &str) -> Motion {
        AnimationDescriptor::timing(v, to, MS_100)
            .easing(Easing::Linear)
            .label(label)
            .into()
    }

    #[test]
    fn single_runs_to_completion_once() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 1.0, "a"));
        assert_eq!(handle.status(), RunStatus::Idle);

        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);
        assert!(handle.is_running());
        assert_eq!(orch.tick(Duration::from_millis(50)), 0);
        assert_eq!(orch.tick(Duration::from_millis(50)), 1);
        assert_eq!(slot.fire_count(), 1);
        assert_eq!(slot.status(), Some(FinishStatus::Completed));
        assert_eq!(v.get(), 1.0);

        orch.tick(MS_100);
        assert_eq!(slot.fire_count(), 1);
        assert_eq!(handle.status(), RunStatus::Completed);
    }

    #[test]
    fn stop_prevents_callback_and_is_idempotent() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 1.0, "a"));
        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);
        orch.tick(Duration::from_millis(40));
        handle.stop();
        handle.stop();
        orch.tick(MS_100);
        assert!(!slot.is_fired());
        assert_eq!(handle.status(), RunStatus::Stopped);
        assert!(v.get() < 1.0);
    }

    #[test]
    fn restart_drops_previous_callback() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 1.0, "a"));
        let (first, cb1) = completion_slot();
        let (second, cb2) = completion_slot();
        handle.start(cb1);
        orch.tick(Duration::from_millis(50));
        handle.start(cb2);
        orch.tick(MS_100);
        assert!(!first.is_fired());
        assert_eq!(second.fire_count(), 1);
    }

    #[test]
    fn critical_truncates_parallel_to_first_member() {
        let orch = orchestrator();
        orch.performance()
            .set_performance_level(LevelSelection::Pinned(PerformanceLevel::Critical));
        let a = AnimatedValue::new(0.0);
        let b = AnimatedValue::new(0.0);
        let handle = orch.run_animation(
            vec![tween(&a, 1.0, "a"), tween(&b, 1.0, "b")],
            CompositionMode::Parallel,
        );
        handle.start(OnFinish::none());
        // Critical batches starts: first tick flushes.
        orch.tick(Duration::ZERO);
        orch.tick(MS_100);
        assert_eq!(a.get(), 1.0);
        assert_eq!(b.get(), 0.0);
    }

    #[test]
    fn stagger_degrades_to_parallel_without_stagger_policy() {
        let a = AnimatedValue::new(0.0);
        let b = AnimatedValue::new(0.0);
        let members = vec![tween(&a, 1.0, "a"), tween(&b, 1.0, "b")];
        let composed = compose(
            &members,
            CompositionMode::Stagger(MS_100),
            &policy(PerformanceLevel::Low),
        );
        assert!(matches!(composed, Motion::Parallel(ref m) if m.len() == 2));
        let composed = compose(
            &members,
            CompositionMode::Stagger(MS_100),
            &policy(PerformanceLevel::High),
        );
        assert!(matches!(composed, Motion::Stagger { .. }));
    }

    #[test]
    fn batched_start_waits_for_interactions() {
        let orch = orchestrator();
        orch.performance()
            .set_performance_level(LevelSelection::Pinned(PerformanceLevel::Medium));
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 1.0, "a"));
        orch.begin_interaction();
        handle.start(OnFinish::none());
        assert_eq!(handle.status(), RunStatus::Deferred);

        orch.tick(MS_100);
        assert_eq!(handle.status(), RunStatus::Deferred);
        assert_eq!(v.get(), 0.0);

        orch.end_interaction();
        orch.tick(MS_100);
        assert_eq!(handle.status(), RunStatus::Running);
        orch.tick(MS_100);
        assert_eq!(handle.status(), RunStatus::Completed);
    }

    #[test]
    fn disabled_animations_suppress_and_complete_synchronously() {
        let orch = orchestrator();
        orch.preferences()
            .update(|s| s.set_app_animations_enabled(false));
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 3.0, "a"));
        assert!(handle.is_suppressed());
        assert_eq!(v.get(), 3.0);

        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);
        assert_eq!(slot.fire_count(), 1);
        assert!(!handle.is_running());
        handle.stop();
        assert_eq!(handle.status(), RunStatus::Completed);
    }

    #[test]
    fn disabling_after_creation_completes_at_start() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 2.0, "a"));
        orch.preferences()
            .update(|s| s.set_runtime_available(false));
        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);
        assert!(slot.is_fired());
        assert_eq!(v.get(), 2.0);
    }

    #[test]
    fn reduce_motion_halves_duration() {
        let orch = orchestrator();
        orch.preferences().set_platform_reduce_motion(true);
        let v = AnimatedValue::new(0.0);
        let handle = orch.run(tween(&v, 1.0, "a"));
        let (slot, on_finish) = completion_slot();
        handle.start(on_finish);
        orch.tick(Duration::from_millis(60));
        assert!(slot.is_fired());
    }

    #[test]
    fn callbacks_may_start_other_animations() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let first = orch.run(tween(&v, 1.0, "a"));
        let second = Rc::new(orch.run(tween(&v, 0.0, "b")));
        let (slot, on_finish) = completion_slot();
        let chained = Rc::clone(&second);
        first.start(OnFinish::new(move |_| chained.start(on_finish)));
        orch.tick(MS_100);
        assert_eq!(second.status(), RunStatus::Running);
        orch.tick(MS_100);
        assert!(slot.is_fired());
        assert_eq!(v.get(), 0.0);
    }

    #[test]
    fn dropped_handle_keeps_running_then_is_reclaimed() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let (slot, on_finish) = completion_slot();
        orch.run(tween(&v, 1.0, "a")).start(on_finish);
        assert_eq!(orch.active_count(), 1);
        orch.tick(MS_100);
        assert!(slot.is_fired());
        assert_eq!(orch.active_count(), 0);
        assert!(format!("{orch:?}").contains("slots: 0"));
    }

    #[test]
    fn events_are_drained_in_order() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let handle = orch.run_animation(
            vec![tween(&v, 1.0, "a"), tween(&v, 2.0, "b")],
            CompositionMode::Sequence,
        );
        handle.start(OnFinish::none());
        orch.tick(MS_100);
        let labels: Vec<_> = orch
            .drain_events()
            .iter()
            .map(|e| e.label().to_owned())
            .collect();
        assert_eq!(labels, ["a", "a", "b"]);
        assert!(orch.drain_events().is_empty());
    }

    #[test]
    fn stop_all_silences_everything() {
        let orch = orchestrator();
        let v = AnimatedValue::new(0.0);
        let (slot, on_finish) = completion_slot();
        let handle = orch.run(tween(&v, 1.0, "a"));
        handle.start(on_finish);
        orch.stop_all();
        orch.tick(MS_100);
        assert!(!slot.is_fired());
        assert_eq!(handle.status(), RunStatus::Stopped);
    }
}
