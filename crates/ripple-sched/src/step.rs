//! Steps - pending deltas awaiting their turn in the queue

use ripple_core::{FieldId, OwnerId, StepId};

use crate::{Phase, QueueKey};

/// Which delta bucket of a deferred field a step belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Applied in the round the step was created in
    Current,
    /// Lagged by one round (fed by round-incrementing links)
    Next,
}

/// A scheduler entry holding the accumulated delta of one deferred field
/// for one round.
///
/// Lifecycle: unqueued -> queued -> dequeued and processed -> unqueued.
/// While queued, further deltas for the same field and round are merged
/// into this step instead of creating a second one.
#[derive(Clone, Debug)]
pub struct Step {
    id: StepId,
    target: FieldId,
    owner: OwnerId,
    phase: Phase,
    round: u64,
    delta: f64,
    sort_value: i64,
    /// Key under which the step is currently queued
    key: Option<QueueKey>,
}

impl Step {
    pub fn new(id: StepId, target: FieldId, owner: OwnerId, phase: Phase, round: u64) -> Self {
        Step {
            id,
            target,
            owner,
            phase,
            round,
            delta: 0.0,
            sort_value: 0,
            key: None,
        }
    }

    #[inline]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[inline]
    pub fn target(&self) -> FieldId {
        self.target
    }

    #[inline]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Accumulated, not yet applied delta
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    #[inline]
    pub fn sort_value(&self) -> i64 {
        self.sort_value
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.key.is_some()
    }

    #[inline]
    pub fn key(&self) -> Option<QueueKey> {
        self.key
    }

    /// Merge another delta into this step
    pub fn accumulate(&mut self, delta: f64) {
        self.delta += delta;
    }

    /// Move this step to a later (or equal) round. Only valid while unqueued.
    pub fn set_round(&mut self, round: u64) {
        debug_assert!(!self.is_queued(), "cannot move a queued step");
        self.round = round;
    }

    /// Set the sort key directly. Only valid while unqueued, use
    /// `Queue::resort` for queued steps.
    pub fn set_sort_value(&mut self, sort_value: i64) {
        debug_assert!(!self.is_queued(), "use Queue::resort for queued steps");
        self.sort_value = sort_value;
    }

    /// Forget the queue key after the step was popped
    pub fn mark_dequeued(&mut self) {
        self.key = None;
    }

    pub(crate) fn attach(&mut self, key: QueueKey) {
        self.sort_value = key.sort_value;
        self.key = Some(key);
    }

    /// Sort key for value-sorted steps: larger pending magnitude sorts first
    pub fn magnitude_sort_value(delta: f64, precision: f64) -> i64 {
        let scaled = (delta.abs() * precision).round();
        if scaled.is_finite() {
            -(scaled.min(i64::MAX as f64) as i64)
        } else {
            i64::MIN
        }
    }
}
