#![forbid(unsafe_code)]

//! Animation primitives.
//!
//! Time-based building blocks shared by the orchestrator and the particle
//! engine:
//!
//! - [`Easing`]: timing curves, including cubic-bezier and overshooting
//!   "back" curves.
//! - [`Timing`]: a normalized progress clock implementing [`Animation`].
//! - [`AnimatedValue`]: a shared `f32` channel written by animations and read
//!   by the renderer.
//! - [`AnimationDescriptor`]: an immutable description of one animated
//!   channel (target value, duration, delay, easing).
//! - [`Tween`]: a running descriptor that writes its channel on every tick.
//!
//! Descriptors are either timed (duration plus easing) or physical
//! ([`spring::SpringConfig`]). Composition lives in [`motion`]; one-shot
//! completion in [`completion`].
//!
//! All types here are single-threaded (`!Send`): they are driven from the
//! host's per-frame tick on one thread.

pub mod completion;
pub mod motion;
pub mod spring;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub use completion::{CompletionSlot, FinishStatus, MotionEvent, OnFinish, completion_slot};
pub use motion::{Motion, MotionRun, stagger_offsets};
pub use spring::{Spring, SpringConfig};

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f32) -> f32;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in (slower start than quadratic).
#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Cubic ease-out (slower end than quadratic).
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Exponential ease-out. Reaches exactly 1.0 at `t = 1`.
#[inline]
pub fn ease_out_expo(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * t)
    }
}

/// "Back" ease-out: overshoots past 1.0 before settling.
///
/// `overshoot` controls the size of the bump; `0.0` degenerates to a cubic
/// ease-out. Output is **not** clamped to [0, 1].
#[inline]
pub fn ease_out_back(t: f32, overshoot: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * ((overshoot + 1.0) * t + overshoot) + 1.0
}

/// Multiply a duration by `factor`, rounding to the nearest microsecond.
///
/// Microsecond rounding absorbs the representation error of `f32` factors,
/// so `300ms * 0.5` and `1s * 0.2` come out exact. Negative or non-finite
/// factors leave the duration unchanged.
pub fn scale_duration(d: Duration, factor: f32) -> Duration {
    if !factor.is_finite() || factor < 0.0 {
        return d;
    }
    let micros = (d.as_nanos() as f64 * f64::from(factor) / 1_000.0).round();
    if micros >= (u64::MAX / 1_000) as f64 {
        Duration::from_nanos(u64::MAX)
    } else {
        Duration::from_micros(micros as u64)
    }
}

// ---------------------------------------------------------------------------
// Cubic bezier
// ---------------------------------------------------------------------------

/// A CSS-style cubic-bezier timing curve with endpoints fixed at (0,0), (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CubicBezier {
    /// Create a curve from its two control points.
    ///
    /// `x1` and `x2` are clamped to [0, 1] so the curve stays a function of
    /// time; `y` values may leave that range for overshooting curves.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    fn sample(a1: f32, a2: f32, s: f32) -> f32 {
        // Bernstein form with P0 = 0 and P3 = 1.
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    }

    fn slope(a1: f32, a2: f32, s: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    }

    /// Solve the curve parameter for time `x` (Newton first, bisection fallback).
    fn solve_parameter(&self, x: f32) -> f32 {
        let mut s = x;
        for _ in 0..8 {
            let err = Self::sample(self.x1, self.x2, s) - x;
            if err.abs() < 1e-5 {
                return s;
            }
            let d = Self::slope(self.x1, self.x2, s);
            if d.abs() < 1e-6 {
                break;
            }
            s -= err / d;
        }

        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        s = x;
        for _ in 0..32 {
            let value = Self::sample(self.x1, self.x2, s);
            if (value - x).abs() < 1e-5 {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) / 2.0;
        }
        s
    }

    /// Evaluate the curve at time `t` in [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        Self::sample(self.y1, self.y2, self.solve_parameter(t))
    }
}

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// A timing curve for one animated channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in-out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Exponential ease-out.
    OutExpo,
    /// Overshooting ease-out with the given overshoot amount.
    OutBack(f32),
    /// Arbitrary cubic-bezier curve.
    Bezier(CubicBezier),
}

impl Easing {
    /// General-purpose curve used when a descriptor does not pick one.
    pub const STANDARD: Self = Self::Bezier(CubicBezier::new(0.25, 0.1, 0.25, 1.0));

    /// Evaluate the curve at `t` (clamped to [0, 1]).
    ///
    /// Every curve maps 0 to 0 and 1 to 1; `OutBack` and some bezier curves
    /// leave [0, 1] in between.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => linear(t),
            Self::InQuad => ease_in(t),
            Self::OutQuad => ease_out(t),
            Self::InOutQuad => ease_in_out(t),
            Self::InCubic => ease_in_cubic(t),
            Self::OutCubic => ease_out_cubic(t),
            Self::OutExpo => ease_out_expo(t),
            Self::OutBack(overshoot) => ease_out_back(t, overshoot),
            Self::Bezier(curve) => curve.apply(t),
        }
    }

    /// Whether this is the constant-velocity curve.
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Linear)
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl From<EasingFn> for Easing {
    /// Best-effort mapping of the plain easing functions onto variants.
    fn from(f: EasingFn) -> Self {
        let candidates: [(EasingFn, Easing); 6] = [
            (ease_in, Self::InQuad),
            (ease_out, Self::OutQuad),
            (ease_in_out, Self::InOutQuad),
            (ease_in_cubic, Self::InCubic),
            (ease_out_cubic, Self::OutCubic),
            (ease_out_expo, Self::OutExpo),
        ];
        candidates
            .into_iter()
            .find(|(candidate, _)| std::ptr::fn_addr_eq(*candidate, f))
            .map_or(Self::Linear, |(_, easing)| easing)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing a progress value.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current eased progress. 0.0 at the start, 1.0 at the end.
    fn value(&self) -> f32;

    /// Reset the animation to its initial state.
    fn reset(&mut self);

    /// Time elapsed past completion. Used by composition to forward
    /// remaining time (a sequence forwards overshoot from one step to the next).
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Progress from 0.0 to 1.0 over a duration, shaped by an [`Easing`].
///
/// Tracks elapsed time as [`Duration`] internally for precise accumulation
/// (no floating-point drift) and accurate overshoot calculation.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
}

impl Timing {
    /// Create a timing with the given duration and linear easing.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: Easing::Linear,
        }
    }

    /// Set the easing curve.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    pub fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Timing {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        if self.is_complete() {
            return 1.0;
        }
        self.easing.apply(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

// ---------------------------------------------------------------------------
// AnimatedValue
// ---------------------------------------------------------------------------

/// A shared animated scalar.
///
/// Cloning yields another handle to the same channel. The renderer reads it;
/// exactly one running animation writes it at a time.
#[derive(Clone, Default)]
pub struct AnimatedValue {
    cell: Rc<Cell<f32>>,
}

impl AnimatedValue {
    /// Create a channel holding `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            cell: Rc::new(Cell::new(initial)),
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.cell.get()
    }

    /// Overwrite the current value.
    #[inline]
    pub fn set(&self, value: f32) {
        self.cell.set(value);
    }

    /// Whether two handles refer to the same channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnimatedValue").field(&self.get()).finish()
    }
}

// ---------------------------------------------------------------------------
// AnimationDescriptor
// ---------------------------------------------------------------------------

/// Immutable description of one animated channel.
///
/// The start value is not part of the descriptor: it is read from the
/// channel when the animation actually starts, so chained descriptors on the
/// same channel continue from wherever the previous one left it.
///
/// Spring descriptors ignore the easing; their [`duration`](Self::duration)
/// is the settle time of a unit displacement, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct AnimationDescriptor {
    target: AnimatedValue,
    to: f32,
    duration: Duration,
    delay: Duration,
    easing: Easing,
    spring: Option<SpringConfig>,
    native_driver: bool,
    label: Option<Rc<str>>,
}

impl AnimationDescriptor {
    /// Animate `target` to `to` over `duration` with the standard curve.
    pub fn timing(target: &AnimatedValue, to: f32, duration: Duration) -> Self {
        Self {
            target: target.clone(),
            to,
            duration,
            delay: Duration::ZERO,
            easing: Easing::STANDARD,
            spring: None,
            native_driver: true,
            label: None,
        }
    }

    /// Pull `target` to `to` with a spring.
    pub fn spring(target: &AnimatedValue, to: f32, config: SpringConfig) -> Self {
        Self {
            duration: config.settle_duration(1.0),
            spring: Some(config),
            ..Self::timing(target, to, Duration::ZERO)
        }
    }

    /// Set the easing curve (builder).
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Wait `delay` before starting (builder).
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Hint whether the host may offload this channel to a native driver.
    #[must_use]
    pub fn native_driver(mut self, enabled: bool) -> Self {
        self.native_driver = enabled;
        self
    }

    /// Attach a diagnostic label; labeled descriptors emit [`MotionEvent`]s.
    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(Rc::from(label));
        self
    }

    /// The animated channel.
    pub fn target(&self) -> &AnimatedValue {
        &self.target
    }

    /// Final value.
    pub fn to_value(&self) -> f32 {
        self.to
    }

    /// Active duration (excluding delay).
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start delay.
    pub fn start_delay(&self) -> Duration {
        self.delay
    }

    /// Timing curve.
    pub fn curve(&self) -> Easing {
        self.easing
    }

    /// Spring tuning, for spring descriptors.
    pub fn spring_config(&self) -> Option<SpringConfig> {
        self.spring
    }

    /// Native driver hint.
    pub fn uses_native_driver(&self) -> bool {
        self.native_driver
    }

    /// Diagnostic label, if any.
    pub fn label_str(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn label_rc(&self) -> Option<Rc<str>> {
        self.label.clone()
    }

    /// A copy with the delay multiplied by `factor`, adjusted for reduce
    /// motion when `reduce` is set.
    ///
    /// Timed descriptors also scale their duration and, under `reduce`,
    /// switch to [`Easing::Linear`]. Springs keep their physics unless
    /// `reduce` is set, in which case they take [`SpringConfig::reduced`].
    #[must_use]
    pub fn adjusted(&self, factor: f32, reduce: bool) -> Self {
        let mut out = self.clone();
        out.delay = scale_duration(self.delay, factor);
        match self.spring {
            Some(config) => {
                if reduce {
                    let reduced = config.reduced();
                    out.spring = Some(reduced);
                    out.duration = reduced.settle_duration(1.0);
                }
            }
            None => {
                out.duration = scale_duration(self.duration, factor);
                if reduce {
                    out.easing = Easing::Linear;
                }
            }
        }
        out
    }

    /// Total time from start to completion (delay + duration).
    pub fn total_duration(&self) -> Duration {
        self.delay.saturating_add(self.duration)
    }

    /// Write the final value immediately.
    pub fn apply_final(&self) {
        self.target.set(self.to);
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Drive {
    Timed(Timing),
    Spring(Spring),
}

impl Drive {
    fn clock(&self) -> &dyn Animation {
        match self {
            Self::Timed(timing) => timing,
            Self::Spring(spring) => spring,
        }
    }

    fn clock_mut(&mut self) -> &mut dyn Animation {
        match self {
            Self::Timed(timing) => timing,
            Self::Spring(spring) => spring,
        }
    }
}

/// A running [`AnimationDescriptor`].
///
/// Waits out the descriptor's delay, captures the channel's current value as
/// the start point, then writes `from + (to - from) * eased` on every tick
/// (or the spring's position, for spring descriptors). The exact target
/// value is written on completion.
#[derive(Debug, Clone)]
pub struct Tween {
    descriptor: AnimationDescriptor,
    drive: Drive,
    waited: Duration,
    from: f32,
    started: bool,
}

impl Tween {
    /// Prepare a tween; nothing is written until [`begin`](Self::begin) or a tick.
    pub fn new(descriptor: AnimationDescriptor) -> Self {
        let drive = Self::drive_for(&descriptor, 0.0);
        Self {
            descriptor,
            drive,
            waited: Duration::ZERO,
            from: 0.0,
            started: false,
        }
    }

    fn drive_for(descriptor: &AnimationDescriptor, from: f32) -> Drive {
        match descriptor.spring {
            Some(config) => Drive::Spring(Spring::new(config, from, descriptor.to)),
            None => Drive::Timed(Timing::new(descriptor.duration).easing(descriptor.easing)),
        }
    }

    /// Begin immediately if there is no delay.
    pub fn begin(&mut self) {
        if !self.started && self.descriptor.delay.is_zero() {
            self.launch();
        }
    }

    fn launch(&mut self) {
        self.started = true;
        self.from = self.descriptor.target.get();
        if self.descriptor.spring.is_some() {
            self.drive = Self::drive_for(&self.descriptor, self.from);
        }
    }

    fn write(&self) {
        let v = if self.drive.clock().is_complete() {
            self.descriptor.to
        } else {
            match &self.drive {
                Drive::Timed(timing) => {
                    self.from + (self.descriptor.to - self.from) * timing.value()
                }
                Drive::Spring(spring) => spring.position(),
            }
        };
        self.descriptor.target.set(v);
    }

    /// Whether the delay has elapsed and the start value was captured.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// The descriptor being played.
    pub fn descriptor(&self) -> &AnimationDescriptor {
        &self.descriptor
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        if self.started {
            self.drive.clock_mut().tick(dt);
        } else {
            self.waited = self.waited.saturating_add(dt);
            if self.waited < self.descriptor.delay {
                return;
            }
            let os = self.waited.saturating_sub(self.descriptor.delay);
            self.launch();
            self.drive.clock_mut().tick(os);
        }
        self.write();
    }

    fn is_complete(&self) -> bool {
        self.started && self.drive.clock().is_complete()
    }

    fn value(&self) -> f32 {
        if self.started {
            self.drive.clock().value()
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.drive.clock_mut().reset();
        self.waited = Duration::ZERO;
        self.started = false;
    }

    fn overshoot(&self) -> Duration {
        if self.started {
            self.drive.clock().overshoot()
        } else {
            Duration::ZERO
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);
    const MS_100: Duration = Duration::from_millis(100);
    const MS_500: Duration = Duration::from_millis(500);
    const SEC_1: Duration = Duration::from_secs(1);

    // ---- Easing tests ----

    #[test]
    fn easing_linear_endpoints() {
        assert!((linear(0.0) - 0.0).abs() < f32::EPSILON);
        assert!((linear(1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn easing_clamps_input() {
        assert!((linear(-1.0) - 0.0).abs() < f32::EPSILON);
        assert!((linear(2.0) - 1.0).abs() < f32::EPSILON);
        assert!((ease_in(-0.5) - 0.0).abs() < f32::EPSILON);
        assert!((ease_out(1.5) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ease_out_faster_start() {
        assert!(ease_out(0.5) > linear(0.5));
        assert!(ease_out_expo(0.5) > ease_out(0.5));
    }

    #[test]
    fn expo_reaches_one() {
        assert!((ease_out_expo(1.0) - 1.0).abs() < f32::EPSILON);
        assert!(ease_out_expo(0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn back_overshoots_then_settles() {
        let peak = (1..100)
            .map(|i| ease_out_back(i as f32 / 100.0, 1.5))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0, "back curve should overshoot, peak={peak}");
        assert!((ease_out_back(1.0, 1.5) - 1.0).abs() < 1e-5);
        assert!(ease_out_back(0.0, 1.5).abs() < 1e-5);
    }

    #[test]
    fn bezier_endpoints_exact() {
        let curve = CubicBezier::new(0.215, 0.61, 0.355, 1.0);
        assert_eq!(curve.apply(0.0), 0.0);
        assert_eq!(curve.apply(1.0), 1.0);
    }

    #[test]
    fn bezier_linear_control_points_is_identity() {
        let curve = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.apply(t) - t).abs() < 1e-3, "t={t}");
        }
    }

    #[test]
    fn bezier_ease_out_shape() {
        let curve = CubicBezier::new(0.215, 0.61, 0.355, 1.0);
        assert!(curve.apply(0.5) > 0.5);
    }

    #[test]
    fn scale_duration_rounds_to_micros() {
        assert_eq!(
            scale_duration(Duration::from_millis(300), 0.5),
            Duration::from_millis(150)
        );
        assert_eq!(
            scale_duration(Duration::from_millis(1000), 0.2),
            Duration::from_millis(200)
        );
        assert_eq!(
            scale_duration(Duration::from_millis(1500), 0.7),
            Duration::from_millis(1050)
        );
        assert_eq!(scale_duration(MS_100, -1.0), MS_100);
        assert_eq!(scale_duration(MS_100, f32::NAN), MS_100);
        assert_eq!(scale_duration(MS_100, 0.0), Duration::ZERO);
    }

    #[test]
    fn easing_from_fn_pointer() {
        assert_eq!(Easing::from(ease_in as EasingFn), Easing::InQuad);
        assert_eq!(Easing::from(linear as EasingFn), Easing::Linear);
    }

    // ---- Timing tests ----

    #[test]
    fn timing_starts_at_zero() {
        let timing = Timing::new(SEC_1);
        assert!((timing.value() - 0.0).abs() < f32::EPSILON);
        assert!(!timing.is_complete());
    }

    #[test]
    fn timing_midpoint_with_quad() {
        let mut timing = Timing::new(SEC_1).easing(Easing::InQuad);
        timing.tick(MS_500);
        assert!((timing.value() - 0.25).abs() < 0.01);
        assert!((timing.raw_progress() - 0.5).abs() < 0.01);
    }

    #[test]
    fn timing_zero_duration() {
        let mut timing = Timing::new(Duration::ZERO);
        timing.tick(MS_16);
        assert!(timing.is_complete());
        assert_eq!(timing.value(), 1.0);
    }

    #[test]
    fn timing_overshoot() {
        let mut timing = Timing::new(MS_100);
        timing.tick(Duration::from_millis(130));
        assert_eq!(timing.overshoot(), Duration::from_millis(30));
    }

    // ---- AnimatedValue tests ----

    #[test]
    fn animated_value_clones_share_channel() {
        let a = AnimatedValue::new(1.0);
        let b = a.clone();
        b.set(4.0);
        assert_eq!(a.get(), 4.0);
        assert!(a.same_channel(&b));
        assert!(!a.same_channel(&AnimatedValue::new(4.0)));
    }

    // ---- Descriptor tests ----

    #[test]
    fn descriptor_adjusted_scales_and_linearizes() {
        let v = AnimatedValue::new(0.0);
        let d = AnimationDescriptor::timing(&v, 1.0, SEC_1)
            .delay(MS_100)
            .easing(Easing::OutExpo);
        let half = d.adjusted(0.5, true);
        assert_eq!(half.duration(), MS_500);
        assert_eq!(half.start_delay(), Duration::from_millis(50));
        assert!(half.curve().is_linear());
        // Original untouched.
        assert_eq!(d.curve(), Easing::OutExpo);
    }

    // ---- Tween tests ----

    #[test]
    fn tween_captures_start_value_on_begin() {
        let v = AnimatedValue::new(10.0);
        let mut tween =
            Tween::new(AnimationDescriptor::timing(&v, 20.0, SEC_1).easing(Easing::Linear));
        v.set(0.0);
        tween.begin();
        tween.tick(MS_500);
        assert!((v.get() - 10.0).abs() < 0.01);
    }

    #[test]
    fn tween_writes_exact_target_on_completion() {
        let v = AnimatedValue::new(0.0);
        let mut tween = Tween::new(
            AnimationDescriptor::timing(&v, 3.0, MS_100)
                .easing(Easing::Bezier(CubicBezier::new(0.25, 0.46, 0.45, 0.94))),
        );
        tween.begin();
        tween.tick(SEC_1);
        assert!(tween.is_complete());
        assert_eq!(v.get(), 3.0);
        assert_eq!(tween.overshoot(), Duration::from_millis(900));
    }

    #[test]
    fn tween_waits_for_delay() {
        let v = AnimatedValue::new(0.0);
        let mut tween = Tween::new(
            AnimationDescriptor::timing(&v, 1.0, MS_100)
                .delay(MS_100)
                .easing(Easing::Linear),
        );
        tween.begin();
        assert!(!tween.has_started());

        tween.tick(Duration::from_millis(50));
        assert!(!tween.has_started());
        assert_eq!(v.get(), 0.0);

        // 100ms past the start: 50ms into the active phase.
        tween.tick(MS_100);
        assert!(tween.has_started());
        assert!((v.get() - 0.5).abs() < 0.01);
    }

    #[test]
    fn spring_tween_starts_from_channel_and_settles() {
        let v = AnimatedValue::new(5.0);
        let mut tween = Tween::new(AnimationDescriptor::spring(
            &v,
            10.0,
            SpringConfig::default(),
        ));
        tween.begin();
        tween.tick(MS_16);
        assert!(v.get() > 5.0 && v.get() < 10.0);
        for _ in 0..200 {
            if tween.is_complete() {
                break;
            }
            tween.tick(MS_16);
        }
        assert!(tween.is_complete());
        assert_eq!(v.get(), 10.0);
    }

    #[test]
    fn spring_descriptor_adjusted_damps_instead_of_scaling() {
        let v = AnimatedValue::new(0.0);
        let d = AnimationDescriptor::spring(&v, 1.0, SpringConfig::new(40.0, 7.0)).delay(MS_100);
        let same = d.adjusted(0.5, false);
        assert_eq!(same.spring_config(), d.spring_config());
        assert_eq!(same.duration(), d.duration());
        assert_eq!(same.start_delay(), Duration::from_millis(50));

        let reduced = d.adjusted(0.5, true);
        let config = reduced.spring_config().unwrap();
        assert_eq!(config.friction, 10.5);
        assert_eq!(config.rest_speed_threshold, 0.1);
        assert!(reduced.duration() < d.duration());
    }

    #[test]
    fn tween_reset_recaptures_start() {
        let v = AnimatedValue::new(0.0);
        let mut tween = Tween::new(AnimationDescriptor::timing(&v, 1.0, MS_100));
        tween.begin();
        tween.tick(MS_100);
        assert!(tween.is_complete());

        tween.reset();
        assert!(!tween.has_started());
        assert!(!tween.is_complete());
    }
}
