#![forbid(unsafe_code)]

//! Completion signalling for composed animations.
//!
//! Two mechanisms, used side by side:
//!
//! - [`OnFinish`]: a one-shot callback. [`fire`](OnFinish::fire) consumes
//!   it, so a callback can run at most once per start.
//! - [`MotionEvent`]: lifecycle milestones of labeled descriptors, queued
//!   during `tick()` and drained by the caller for diagnostics.
//!
//! # Invariants
//!
//! 1. An `OnFinish` that is dropped without firing never runs.
//! 2. `Started` is queued when a labeled descriptor's delay has elapsed;
//!    `Finished` when it reaches its target. Each at most once per run.
//! 3. Draining clears the queue; events are not replayed.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Outcome delivered to a finish callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishStatus {
    /// The animation reached its end (or was suppressed and applied at once).
    Completed,
    /// The animation was stopped before reaching its end.
    ///
    /// Only reported through status queries; callbacks are never invoked
    /// for stopped runs.
    Stopped,
}

impl FinishStatus {
    /// Whether the run completed.
    #[inline]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

/// A finish callback that runs at most once.
#[derive(Default)]
pub struct OnFinish(Option<Box<dyn FnOnce(FinishStatus)>>);

impl OnFinish {
    /// Wrap a closure.
    pub fn new(f: impl FnOnce(FinishStatus) + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A callback that does nothing.
    pub fn none() -> Self {
        Self(None)
    }

    /// Whether a closure is attached.
    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Run the callback, consuming it.
    pub fn fire(self, status: FinishStatus) {
        if let Some(f) = self.0 {
            f(status);
        }
    }
}

impl fmt::Debug for OnFinish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OnFinish")
            .field(&if self.0.is_some() { "Some(..)" } else { "None" })
            .finish()
    }
}

/// Observable record of how many times a paired [`OnFinish`] fired.
///
/// Useful where polling fits better than a closure (tests, frame loops).
#[derive(Debug, Clone, Default)]
pub struct CompletionSlot {
    inner: Rc<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    fired: Cell<u32>,
    last: Cell<Option<FinishStatus>>,
}

impl CompletionSlot {
    /// Status delivered by the last firing, if any.
    pub fn status(&self) -> Option<FinishStatus> {
        self.inner.last.get()
    }

    /// Whether the paired callback fired.
    pub fn is_fired(&self) -> bool {
        self.inner.fired.get() > 0
    }

    /// Number of times the paired callbacks fired.
    ///
    /// A slot can hand out several callbacks via [`on_finish`](Self::on_finish);
    /// each contributes at most one.
    pub fn fire_count(&self) -> u32 {
        self.inner.fired.get()
    }

    /// Another callback recording into this slot.
    pub fn on_finish(&self) -> OnFinish {
        let inner = Rc::clone(&self.inner);
        OnFinish::new(move |status| {
            inner.fired.set(inner.fired.get().saturating_add(1));
            inner.last.set(Some(status));
        })
    }
}

/// Create a slot together with a callback that records into it.
pub fn completion_slot() -> (CompletionSlot, OnFinish) {
    let slot = CompletionSlot::default();
    let on_finish = slot.on_finish();
    (slot, on_finish)
}

/// Lifecycle milestone of a labeled descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionEvent {
    /// The descriptor's delay elapsed and it began writing its channel.
    Started(Rc<str>),
    /// The descriptor reached its target value.
    Finished(Rc<str>),
}

impl MotionEvent {
    /// The descriptor label.
    pub fn label(&self) -> &str {
        match self {
            Self::Started(label) | Self::Finished(label) => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_finish_fires_with_status() {
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);
        let cb = OnFinish::new(move |status| s.set(Some(status)));
        assert!(cb.is_some());
        cb.fire(FinishStatus::Completed);
        assert_eq!(seen.get(), Some(FinishStatus::Completed));
    }

    #[test]
    fn dropped_callback_never_runs() {
        let (slot, cb) = completion_slot();
        drop(cb);
        assert!(!slot.is_fired());
        assert_eq!(slot.status(), None);
    }

    #[test]
    fn none_is_inert() {
        let cb = OnFinish::none();
        assert!(!cb.is_some());
        cb.fire(FinishStatus::Completed);
    }

    #[test]
    fn slot_counts_each_callback() {
        let (slot, first) = completion_slot();
        let second = slot.on_finish();
        first.fire(FinishStatus::Completed);
        assert_eq!(slot.fire_count(), 1);
        second.fire(FinishStatus::Completed);
        assert_eq!(slot.fire_count(), 2);
        assert_eq!(slot.status(), Some(FinishStatus::Completed));
    }

    #[test]
    fn event_label() {
        let e = MotionEvent::Finished(Rc::from("fade"));
        assert_eq!(e.label(), "fade");
    }
}
