//! Processing session - owns the queue and drains it to convergence

use ripple_core::{FieldId, RippleError, RippleResult};
use ripple_sched::{Queue, QueueConfig, StepEntry};

use crate::FieldGraph;

/// Counters of one processing session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Steps applied to a live field
    pub processed: u64,
    /// Steps whose target was torn down or which were merged away
    pub skipped: u64,
    /// Round of the first dequeued step
    pub first_round: Option<u64>,
    /// Round of the last dequeued step
    pub last_round: Option<u64>,
}

impl SessionStats {
    /// Number of rounds the session has spanned so far
    pub fn rounds(&self) -> u64 {
        match (self.first_round, self.last_round) {
            (Some(first), Some(last)) => last - first + 1,
            _ => 0,
        }
    }
}

/// One processing session.
///
/// The session owns its queue exclusively. Updates made through
/// `queue_mut()` while the session is open are deferred into steps;
/// `process` drains them until nothing is left.
#[derive(Debug)]
pub struct Session {
    queue: Queue,
    stats: SessionStats,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Session {
            queue: Queue::with_config(config),
            stats: SessionStats::default(),
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Queue {
        &mut self.queue
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Assign an input field within this session
    pub fn set_value(&mut self, graph: &mut FieldGraph, id: FieldId, value: f64) -> RippleResult<()> {
        graph.set_value(id, value, &mut self.queue)
    }

    /// Dequeue and apply a single step
    pub fn step(&mut self, graph: &mut FieldGraph) -> RippleResult<Option<StepEntry>> {
        let Some(entry) = self.queue.pop() else {
            return Ok(None);
        };
        self.stats.first_round.get_or_insert(entry.round);
        self.stats.last_round = Some(entry.round);

        if graph.process_step(&entry, &mut self.queue)? {
            self.stats.processed += 1;
        } else {
            self.stats.skipped += 1;
        }
        Ok(Some(entry))
    }

    /// Drain the queue. Processing a step may enqueue further steps, so the
    /// loop runs until the queue is empty or the configured budget is spent.
    pub fn process(&mut self, graph: &mut FieldGraph) -> RippleResult<&SessionStats> {
        let budget = self.queue.config().max_steps;
        let mut steps = 0u64;

        while !self.queue.is_empty() {
            if let Some(max) = budget {
                if steps >= max {
                    tracing::warn!(max, pending = self.queue.len(), "step budget exhausted");
                    return Err(RippleError::StepBudgetExhausted(max));
                }
            }
            self.step(graph)?;
            steps += 1;
        }

        tracing::debug!(
            steps,
            processed = self.stats.processed,
            skipped = self.stats.skipped,
            rounds = self.stats.rounds(),
            "session drained"
        );
        Ok(&self.stats)
    }

    /// Nothing left to process
    pub fn is_converged(&self) -> bool {
        self.queue.is_empty()
    }

    /// End the session. Steps still queued are dropped unapplied.
    pub fn finish(self) -> SessionStats {
        if !self.queue.is_empty() {
            tracing::warn!(pending = self.queue.len(), "session finished before converging");
        }
        self.stats
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bucket, Phase, Sum};
    use ripple_core::OwnerId;

    const OWNER: OwnerId = OwnerId(3);

    #[test]
    fn test_coalesced_step_propagates_once() {
        let mut graph = FieldGraph::new();
        let mut session = Session::new();
        let a = graph.add_input(OWNER, "a", None);
        let b = graph.add_input(OWNER, "b", None);
        let q = graph.add_queue_field(OWNER, "q", None, Phase::Inference);
        let out = graph.add_function(OWNER, "out", None, Sum);
        for source in [a, b] {
            graph.connect_input(source, q, false, session.queue_mut()).unwrap();
        }
        graph.connect_input(q, out, false, session.queue_mut()).unwrap();

        let updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = updates.clone();
        graph
            .add_update_listener(out, "count", move |_| counter.set(counter.get() + 1))
            .unwrap();

        session.set_value(&mut graph, a, 0.25).unwrap();
        session.set_value(&mut graph, b, 0.5).unwrap();
        assert_eq!(session.queue().len(), 1);

        let stats = session.process(&mut graph).unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(graph.value(out).unwrap(), 0.75);
        assert_eq!(updates.get(), 1);
        assert!(session.is_converged());
    }

    #[test]
    fn test_next_round_waits_for_current_round() {
        let mut graph = FieldGraph::new();
        let mut session = Session::new();
        let a = graph.add_input(OWNER, "a", None);
        let fast = graph.add_queue_field(OWNER, "fast", None, Phase::Training);
        let slow = graph.add_queue_field(OWNER, "slow", None, Phase::Input);
        graph.connect_input(a, fast, false, session.queue_mut()).unwrap();
        graph.connect_input(a, slow, true, session.queue_mut()).unwrap();

        session.set_value(&mut graph, a, 1.0).unwrap();
        assert_eq!(graph.pending_delta(slow, Bucket::Next).unwrap(), 1.0);

        // Training is the later phase, but its step belongs to the current round
        let first = session.step(&mut graph).unwrap().unwrap();
        assert_eq!(first.target, fast);
        assert_eq!(graph.value(slow).unwrap(), 0.0);

        let second = session.step(&mut graph).unwrap().unwrap();
        assert_eq!(second.target, slow);
        assert_eq!(second.round, first.round + 1);
        assert_eq!(graph.value(slow).unwrap(), 1.0);
        assert_eq!(session.stats().rounds(), 2);
    }

    #[test]
    fn test_value_sorted_larger_delta_first() {
        let mut graph = FieldGraph::new();
        let mut session = Session::new();
        let small = graph.add_input(OWNER, "small", None);
        let large = graph.add_input(OWNER, "large", None);
        let qs = graph.add_sorted_queue_field(OWNER, "qs", None, Phase::Annealing);
        let ql = graph.add_sorted_queue_field(OWNER, "ql", None, Phase::Annealing);
        graph.connect_input(small, qs, false, session.queue_mut()).unwrap();
        graph.connect_input(large, ql, false, session.queue_mut()).unwrap();

        session.set_value(&mut graph, small, 0.1).unwrap();
        session.set_value(&mut graph, large, 0.3).unwrap();
        // Grows past the other step after it was queued
        session.set_value(&mut graph, small, 0.9).unwrap();

        let first = session.step(&mut graph).unwrap().unwrap();
        assert_eq!(first.target, qs);
        let second = session.step(&mut graph).unwrap().unwrap();
        assert_eq!(second.target, ql);
    }

    #[test]
    fn test_disconnect_without_retraction_keeps_step() {
        let mut graph = FieldGraph::new();
        let mut session = Session::new();
        let a = graph.add_input(OWNER, "a", None);
        let q = graph.add_queue_field(OWNER, "q", None, Phase::Inference);
        let link = graph.connect_input(a, q, false, session.queue_mut()).unwrap();
        session.set_value(&mut graph, a, 2.0).unwrap();

        // Disconnect without retraction leaves the queued step in place
        graph.disconnect(link, false, session.queue_mut()).unwrap();
        session.process(&mut graph).unwrap();
        assert_eq!(graph.value(q).unwrap(), 2.0);

        session.set_value(&mut graph, a, 0.0).unwrap();
        assert!(session.is_converged());
    }

    #[test]
    fn test_step_budget() {
        let mut graph = FieldGraph::new();
        let mut session = Session::with_config(QueueConfig::bounded(1));
        let a = graph.add_input(OWNER, "a", None);
        let b = graph.add_input(OWNER, "b", None);
        let qa = graph.add_queue_field(OWNER, "qa", None, Phase::Inference);
        let qb = graph.add_queue_field(OWNER, "qb", None, Phase::Inference);
        graph.connect_input(a, qa, false, session.queue_mut()).unwrap();
        graph.connect_input(b, qb, false, session.queue_mut()).unwrap();
        session.set_value(&mut graph, a, 1.0).unwrap();
        session.set_value(&mut graph, b, 1.0).unwrap();

        assert_eq!(
            session.process(&mut graph).unwrap_err(),
            RippleError::StepBudgetExhausted(1)
        );
    }

    #[test]
    fn test_finish_returns_stats() {
        let session = Session::new();
        let stats = session.finish();
        assert_eq!(stats, SessionStats::default());
        assert_eq!(stats.rounds(), 0);
    }
}
