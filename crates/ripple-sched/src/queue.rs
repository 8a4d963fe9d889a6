//! Session-scoped step queue
//!
//! Steps are totally ordered by `QueueKey`:
//! round, then phase rank, then sort value, then insertion sequence.
//! The sequence number makes the order deterministic for equal keys.

use std::collections::BTreeMap;

use ripple_core::{FieldId, OwnerId, StepId, DEFAULT_SORT_PRECISION};

use crate::{Phase, Step};

/// Queue configuration
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Scale from delta magnitude to integer sort value
    pub sort_precision: f64,
    /// Maximum number of steps a session may process (None = unbounded)
    pub max_steps: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            sort_precision: DEFAULT_SORT_PRECISION,
            max_steps: None,
        }
    }
}

impl QueueConfig {
    /// Configuration that gives up after `max_steps` dequeues
    pub fn bounded(max_steps: u64) -> Self {
        QueueConfig {
            max_steps: Some(max_steps),
            ..QueueConfig::default()
        }
    }
}

/// Total ordering key of a queued step
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey {
    pub round: u64,
    pub phase: Phase,
    pub sort_value: i64,
    pub seq: u64,
}

/// What the queue hands back on `pop`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepEntry {
    pub step: StepId,
    pub target: FieldId,
    pub owner: OwnerId,
    pub phase: Phase,
    pub round: u64,
}

/// Outcome of `Queue::add`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheduled {
    /// Newly inserted
    Inserted,
    /// Already present; the caller merges into the queued step
    AlreadyQueued,
    /// Queue is not live; the caller processes the step in place
    Rejected,
}

/// Queue counters
#[derive(Clone, Debug, Default)]
pub struct QueueStats {
    pub inserted: u64,
    pub already_queued: u64,
    pub rejected: u64,
    pub resorted: u64,
    pub removed: u64,
    pub popped: u64,
}

/// Totally ordered collection of pending steps, owned by one session
#[derive(Debug)]
pub struct Queue {
    config: QueueConfig,
    live: bool,
    entries: BTreeMap<QueueKey, StepEntry>,
    next_seq: u64,
    next_step: u64,
    round: u64,
    stats: QueueStats,
}

impl Queue {
    /// Create a live queue with default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create a live queue with custom configuration
    pub fn with_config(config: QueueConfig) -> Self {
        Queue {
            config,
            live: true,
            entries: BTreeMap::new(),
            next_seq: 0,
            next_step: 1,
            round: 0,
            stats: QueueStats::default(),
        }
    }

    /// Queue outside of any session: every `add` is rejected, so deferred
    /// fields apply their deltas immediately.
    pub fn offline() -> Self {
        let mut queue = Self::new();
        queue.live = false;
        queue
    }

    #[inline]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Stop accepting steps. Already queued steps stay queued.
    pub fn close(&mut self) {
        self.live = false;
    }

    pub fn open(&mut self) {
        self.live = true;
    }

    /// Round of the most recently dequeued step
    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Allocate an identifier for a new step.
    ///
    /// Ids are unique within this queue and are not reused after `clear`.
    pub fn next_step_id(&mut self) -> StepId {
        let id = StepId::new(self.next_step);
        self.next_step += 1;
        id
    }

    /// Insert a step. Returns `AlreadyQueued` if the step is present, in
    /// which case the caller is expected to have merged its delta already.
    pub fn add(&mut self, step: &mut Step) -> Scheduled {
        if !self.live {
            self.stats.rejected += 1;
            return Scheduled::Rejected;
        }
        if self.contains(step) {
            self.stats.already_queued += 1;
            return Scheduled::AlreadyQueued;
        }
        // Key left over from a cleared queue or an earlier session
        step.mark_dequeued();

        let key = QueueKey {
            round: step.round(),
            phase: step.phase(),
            sort_value: step.sort_value(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, Self::entry_for(step));
        step.attach(key);
        self.stats.inserted += 1;

        tracing::trace!(
            step = ?step.id(),
            target = ?step.target(),
            phase = %step.phase(),
            round = step.round(),
            "step queued"
        );
        Scheduled::Inserted
    }

    /// Remove a queued step. Returns false if it was not queued.
    pub fn remove(&mut self, step: &mut Step) -> bool {
        let Some(key) = step.key() else {
            return false;
        };
        let queued = self.contains(step);
        step.mark_dequeued();
        if queued {
            self.entries.remove(&key);
            self.stats.removed += 1;
        }
        queued
    }

    /// Change the sort value of a step. A queued step is taken out and
    /// reinserted under its new key, keeping its sequence number.
    pub fn resort(&mut self, step: &mut Step, sort_value: i64) {
        let old = match step.key() {
            Some(key) if self.contains(step) => key,
            _ => {
                step.mark_dequeued();
                step.set_sort_value(sort_value);
                return;
            }
        };
        if old.sort_value == sort_value {
            return;
        }

        self.entries.remove(&old);
        let key = QueueKey { sort_value, ..old };
        self.entries.insert(key, Self::entry_for(step));
        step.attach(key);
        self.stats.resorted += 1;
    }

    /// Remove and return the lowest-ordered step
    pub fn pop(&mut self) -> Option<StepEntry> {
        let (key, entry) = self.entries.pop_first()?;
        self.round = self.round.max(key.round);
        self.stats.popped += 1;

        tracing::trace!(
            step = ?entry.step,
            target = ?entry.target,
            phase = %entry.phase,
            round = entry.round,
            "step dequeued"
        );
        Some(entry)
    }

    /// Lowest-ordered step without removing it
    pub fn peek(&self) -> Option<&StepEntry> {
        self.entries.values().next()
    }

    /// Whether this exact step is pending in this queue
    pub fn contains(&self, step: &Step) -> bool {
        step.key()
            .and_then(|key| self.entries.get(&key))
            .map_or(false, |entry| entry.step == step.id() && entry.target == step.target())
    }

    /// Entries in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = &StepEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending entry. Steps still held by fields keep a stale
    /// key; `contains` no longer recognizes them, so the next `add`
    /// inserts them afresh.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    fn entry_for(step: &Step) -> StepEntry {
        StepEntry {
            step: step.id(),
            target: step.target(),
            owner: step.owner(),
            phase: step.phase(),
            round: step.round(),
        }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
