#![forbid(unsafe_code)]

//! Composition of animation descriptors.
//!
//! A [`Motion`] is an immutable tree: leaves are [`AnimationDescriptor`]s,
//! inner nodes run their children in parallel, in sequence, or staggered.
//! [`MotionRun`] is the playing form of a tree, advanced by `tick()`.
//!
//! # Invariants
//!
//! 1. Parallel and stagger members start in list order; stagger member `i`
//!    starts `i * delay` after the group.
//! 2. A group finishes on the tick its last member finishes.
//! 3. A sequence step starts only after the previous step finished, and
//!    receives the time left over from the tick in which it finished.
//! 4. Every leaf writes its exact target value when it finishes.
//!
//! # Failure Modes
//!
//! - Empty groups and sequences finish on their first tick.
//! - Zero-duration leaves finish on the first tick after they start.

use std::rc::Rc;
use std::time::Duration;

use super::completion::MotionEvent;
use super::{Animation, AnimationDescriptor, Tween, scale_duration};

// ---------------------------------------------------------------------------
// Stagger offsets
// ---------------------------------------------------------------------------

/// Start offsets for `count` staggered members: `offset[i] = i * delay`.
///
/// Returns an empty vec for zero members; the first offset is always zero.
pub fn stagger_offsets(count: usize, delay: Duration) -> Vec<Duration> {
    (0..count)
        .map(|i| delay.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)))
        .collect()
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// A composable animation tree.
#[derive(Debug, Clone)]
pub enum Motion {
    /// One animated channel.
    Tween(AnimationDescriptor),
    /// Members share one timeline and start together.
    Parallel(Vec<Motion>),
    /// Members run one after another.
    Sequence(Vec<Motion>),
    /// Members start `delay` apart, in order.
    Stagger {
        /// Gap between successive member starts.
        delay: Duration,
        /// Members, in start order.
        members: Vec<Motion>,
    },
}

impl Motion {
    /// Run `members` together.
    pub fn parallel(members: impl IntoIterator<Item = impl Into<Motion>>) -> Self {
        Self::Parallel(members.into_iter().map(Into::into).collect())
    }

    /// Run `members` one after another.
    pub fn sequence(members: impl IntoIterator<Item = impl Into<Motion>>) -> Self {
        Self::Sequence(members.into_iter().map(Into::into).collect())
    }

    /// Start `members` `delay` apart.
    pub fn stagger(delay: Duration, members: impl IntoIterator<Item = impl Into<Motion>>) -> Self {
        Self::Stagger {
            delay,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of leaf descriptors in the tree.
    pub fn descriptor_count(&self) -> usize {
        let mut n = 0;
        self.for_each_descriptor(&mut |_| n += 1);
        n
    }

    /// Visit every leaf, depth first, in list order.
    pub fn for_each_descriptor(&self, f: &mut impl FnMut(&AnimationDescriptor)) {
        match self {
            Self::Tween(d) => f(d),
            Self::Parallel(members)
            | Self::Sequence(members)
            | Self::Stagger { members, .. } => {
                for m in members {
                    m.for_each_descriptor(f);
                }
            }
        }
    }

    /// Write every leaf's target value immediately.
    ///
    /// Leaves are applied in list order, so for a channel animated several
    /// times the last descriptor wins, as it would after a normal run.
    pub fn apply_final_values(&self) {
        self.for_each_descriptor(&mut |d| d.apply_final());
    }

    /// A copy with every duration, delay and stagger gap multiplied by
    /// `factor`; under `reduce`, curves are linearized and springs damped
    /// (see [`AnimationDescriptor::adjusted`]).
    #[must_use]
    pub fn adjusted(&self, factor: f32, reduce: bool) -> Self {
        let map = |members: &[Motion]| -> Vec<Motion> {
            members.iter().map(|m| m.adjusted(factor, reduce)).collect()
        };
        match self {
            Self::Tween(d) => Self::Tween(d.adjusted(factor, reduce)),
            Self::Parallel(members) => Self::Parallel(map(members)),
            Self::Sequence(members) => Self::Sequence(map(members)),
            Self::Stagger { delay, members } => Self::Stagger {
                delay: scale_duration(*delay, factor),
                members: map(members),
            },
        }
    }

    /// Time from start until the whole tree has finished.
    pub fn total_duration(&self) -> Duration {
        match self {
            Self::Tween(d) => d.total_duration(),
            Self::Parallel(members) => members
                .iter()
                .map(Self::total_duration)
                .max()
                .unwrap_or(Duration::ZERO),
            Self::Sequence(members) => members
                .iter()
                .map(Self::total_duration)
                .fold(Duration::ZERO, Duration::saturating_add),
            Self::Stagger { delay, members } => stagger_offsets(members.len(), *delay)
                .into_iter()
                .zip(members)
                .map(|(offset, m)| offset.saturating_add(m.total_duration()))
                .max()
                .unwrap_or(Duration::ZERO),
        }
    }
}

impl From<AnimationDescriptor> for Motion {
    fn from(d: AnimationDescriptor) -> Self {
        Self::Tween(d)
    }
}

// ---------------------------------------------------------------------------
// Running tree
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Node {
    Leaf {
        tween: Tween,
        label: Option<Rc<str>>,
        done: bool,
    },
    Group {
        members: Vec<Node>,
        offsets: Vec<Duration>,
        launched: usize,
        elapsed: Duration,
        done: bool,
    },
    Sequence {
        steps: Vec<Node>,
        current: usize,
        done: bool,
    },
}

impl Node {
    fn build(motion: Motion) -> Self {
        match motion {
            Motion::Tween(d) => {
                let label = d.label_rc();
                Self::Leaf {
                    tween: Tween::new(d),
                    label,
                    done: false,
                }
            }
            Motion::Parallel(members) => Self::group(members, Duration::ZERO),
            Motion::Stagger { delay, members } => Self::group(members, delay),
            Motion::Sequence(steps) => Self::Sequence {
                steps: steps.into_iter().map(Self::build).collect(),
                current: 0,
                done: false,
            },
        }
    }

    fn group(members: Vec<Motion>, delay: Duration) -> Self {
        let offsets = stagger_offsets(members.len(), delay);
        Self::Group {
            members: members.into_iter().map(Self::build).collect(),
            offsets,
            launched: 0,
            elapsed: Duration::ZERO,
            done: false,
        }
    }

    fn is_done(&self) -> bool {
        match self {
            Self::Leaf { done, .. } | Self::Group { done, .. } | Self::Sequence { done, .. } => {
                *done
            }
        }
    }

    fn begin(&mut self, events: &mut Vec<MotionEvent>) {
        match self {
            Self::Leaf { tween, label, .. } => {
                tween.begin();
                if tween.has_started()
                    && let Some(label) = label
                {
                    events.push(MotionEvent::Started(Rc::clone(label)));
                }
            }
            Self::Group {
                members,
                offsets,
                launched,
                ..
            } => {
                while *launched < members.len() && offsets[*launched].is_zero() {
                    members[*launched].begin(events);
                    *launched += 1;
                }
            }
            Self::Sequence { steps, .. } => {
                if let Some(first) = steps.first_mut() {
                    first.begin(events);
                }
            }
        }
    }

    /// Advance by `dt`. Returns the unused part of `dt` once finished.
    fn advance(&mut self, dt: Duration, events: &mut Vec<MotionEvent>) -> Option<Duration> {
        if self.is_done() {
            return Some(dt);
        }
        match self {
            Self::Leaf { tween, label, done } => {
                let was_started = tween.has_started();
                tween.tick(dt);
                if !was_started
                    && tween.has_started()
                    && let Some(label) = label
                {
                    events.push(MotionEvent::Started(Rc::clone(label)));
                }
                if !tween.is_complete() {
                    return None;
                }
                *done = true;
                if let Some(label) = label {
                    events.push(MotionEvent::Finished(Rc::clone(label)));
                }
                Some(tween.overshoot().min(dt))
            }
            Self::Group {
                members,
                offsets,
                launched,
                elapsed,
                done,
            } => {
                *elapsed = elapsed.saturating_add(dt);
                let mut leftover: Option<Duration> = None;
                for i in 0..members.len() {
                    let step = if i < *launched {
                        dt
                    } else if *elapsed >= offsets[i] {
                        members[i].begin(events);
                        *launched = i + 1;
                        *elapsed - offsets[i]
                    } else {
                        break;
                    };
                    if members[i].is_done() {
                        continue;
                    }
                    if let Some(rest) = members[i].advance(step, events) {
                        leftover = Some(leftover.map_or(rest, |l| l.min(rest)));
                    }
                }
                if !members.iter().all(Node::is_done) {
                    return None;
                }
                *done = true;
                Some(leftover.unwrap_or(dt))
            }
            Self::Sequence {
                steps,
                current,
                done,
            } => {
                let mut remaining = dt;
                while *current < steps.len() {
                    match steps[*current].advance(remaining, events) {
                        None => return None,
                        Some(rest) => {
                            remaining = rest;
                            *current += 1;
                            if let Some(next) = steps.get_mut(*current) {
                                next.begin(events);
                            }
                        }
                    }
                }
                *done = true;
                Some(remaining)
            }
        }
    }
}

/// A [`Motion`] in progress.
///
/// Dropping a run leaves every channel at the value it last wrote.
#[derive(Debug)]
pub struct MotionRun {
    root: Node,
    begun: bool,
}

impl MotionRun {
    /// Prepare a run. Nothing is written until [`begin`](Self::begin).
    pub fn new(motion: Motion) -> Self {
        Self {
            root: Node::build(motion),
            begun: false,
        }
    }

    /// Start every member due at time zero, capturing their start values.
    pub fn begin(&mut self, events: &mut Vec<MotionEvent>) {
        if !self.begun {
            self.begun = true;
            self.root.begin(events);
        }
    }

    /// Advance by `dt`; returns `true` once the whole tree has finished.
    pub fn tick(&mut self, dt: Duration, events: &mut Vec<MotionEvent>) -> bool {
        self.begin(events);
        self.root.advance(dt, events).is_some()
    }

    /// Whether the whole tree has finished.
    pub fn is_complete(&self) -> bool {
        self.root.is_done()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
