//! Deferred (queue) field state - two round buckets of pending steps

use ripple_core::StepId;
use ripple_sched::{Bucket, Phase, Queue, Step};

/// Per-field scheduling state of a queue field
///
/// `current` collects deltas for the round being processed, `next` the
/// deltas that arrived over round-incrementing links. At most one live
/// step exists per bucket; further deltas are merged into it.
#[derive(Debug)]
pub struct DeferredState {
    phase: Phase,
    value_sorted: bool,
    current: Option<Step>,
    next: Option<Step>,
}

impl DeferredState {
    pub(crate) fn new(phase: Phase, value_sorted: bool) -> Self {
        DeferredState {
            phase,
            value_sorted,
            current: None,
            next: None,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether pending magnitude decides the order within the phase
    #[inline]
    pub fn is_value_sorted(&self) -> bool {
        self.value_sorted
    }

    pub fn step(&self, bucket: Bucket) -> Option<&Step> {
        match bucket {
            Bucket::Current => self.current.as_ref(),
            Bucket::Next => self.next.as_ref(),
        }
    }

    /// Delta waiting in a bucket, zero if it holds no step
    pub fn pending_delta(&self, bucket: Bucket) -> f64 {
        self.step(bucket).map_or(0.0, Step::delta)
    }

    pub(crate) fn slot_mut(&mut self, bucket: Bucket) -> &mut Option<Step> {
        match bucket {
            Bucket::Current => &mut self.current,
            Bucket::Next => &mut self.next,
        }
    }

    /// Slide the buffering forward once the next bucket's round is due.
    ///
    /// The next step becomes the current one. If a current step still
    /// exists, the next step's delta is merged into it and its queue entry
    /// dropped; a value-sorted current step is re-sorted on the merged delta.
    pub(crate) fn slide(&mut self, round: u64, queue: &mut Queue) {
        if !self.next.as_ref().map_or(false, |step| step.round() <= round) {
            return;
        }
        let Some(mut next) = self.next.take() else {
            return;
        };
        match self.current.as_mut() {
            None => self.current = Some(next),
            Some(current) => {
                queue.remove(&mut next);
                current.accumulate(next.delta());
                if self.value_sorted {
                    let precision = queue.config().sort_precision;
                    let sort_value = Step::magnitude_sort_value(current.delta(), precision);
                    queue.resort(current, sort_value);
                }
            }
        }
    }

    /// Take the step a dequeued entry refers to. A next-round step is
    /// promoted to current before it is handed out. Returns None for a
    /// stale entry.
    pub(crate) fn take(&mut self, id: StepId) -> Option<Step> {
        if self.current.as_ref().map_or(false, |step| step.id() == id) {
            return self.current.take();
        }
        if self.next.as_ref().map_or(false, |step| step.id() == id) {
            if self.current.is_none() {
                self.current = self.next.take();
                return self.current.take();
            }
            return self.next.take();
        }
        None
    }

    /// Remove both steps, for teardown
    pub(crate) fn take_all(&mut self) -> impl Iterator<Item = Step> {
        self.current.take().into_iter().chain(self.next.take())
    }
}
