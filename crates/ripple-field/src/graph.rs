//! Field graph - arena of fields and links, and the propagation engine
//!
//! Synchronous fields apply a delta and push it through their receivers
//! recursively. Queue fields stop the recursion: they file the delta into
//! a step and apply it when the session dequeues that step.

use ripple_core::{FieldId, LinkId, OwnerId, RippleError, RippleResult};
use ripple_sched::{Bucket, Phase, Queue, Scheduled, Step, StepEntry};

use crate::field::{FieldKind, Listener};
use crate::{
    Arity, DeferredState, Field, FieldFunction, FieldLink, FieldUpdate, GraphConfig, InputSlot,
    ListenerFn, ListenerKind, Output,
};

/// Owner of every field and link of one network
#[derive(Debug)]
pub struct FieldGraph {
    config: GraphConfig,
    fields: Vec<Option<Field>>,
    links: Vec<Option<FieldLink>>,
}

impl FieldGraph {
    /// Create an empty graph with default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with custom configuration
    pub fn with_config(config: GraphConfig) -> Self {
        FieldGraph {
            config,
            fields: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Add a root field that is assigned from outside
    pub fn add_input(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
    ) -> FieldId {
        self.insert_field(owner, label.into(), tolerance, FieldKind::Input)
    }

    /// Add a synchronous function node with no inputs linked yet
    pub fn add_function(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        function: impl FieldFunction + 'static,
    ) -> FieldId {
        self.insert_field(
            owner,
            label.into(),
            tolerance,
            FieldKind::Function(Box::new(function)),
        )
    }

    /// Add a deferred sum field whose steps are processed in `phase`
    pub fn add_queue_field(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        phase: Phase,
    ) -> FieldId {
        let kind = FieldKind::Deferred(DeferredState::new(phase, false));
        self.insert_field(owner, label.into(), tolerance, kind)
    }

    /// Add a deferred sum field whose steps are ordered by pending magnitude
    pub fn add_sorted_queue_field(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        phase: Phase,
    ) -> FieldId {
        let kind = FieldKind::Deferred(DeferredState::new(phase, true));
        self.insert_field(owner, label.into(), tolerance, kind)
    }

    fn insert_field(
        &mut self,
        owner: OwnerId,
        label: String,
        tolerance: Option<f64>,
        kind: FieldKind,
    ) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        let tolerance = tolerance.or(self.config.default_tolerance);
        self.fields
            .push(Some(Field::new(id, owner, label, tolerance, kind)));
        id
    }

    /// Create an unconnected link into the next free argument of `sink`
    pub fn link(&mut self, source: FieldId, sink: FieldId) -> RippleResult<LinkId> {
        let field = self.field(sink)?;
        let arg = match field.arity() {
            _ if field.is_input() => return Err(RippleError::NotAnInput(sink)),
            Arity::Variadic => field.inputs.len(),
            Arity::Fixed(_) => field
                .inputs
                .iter()
                .position(|slot| slot.link.is_none())
                .ok_or(RippleError::NoFreeArgument(sink))?,
        };
        self.link_arg(source, sink, arg)
    }

    /// Create an unconnected link into argument `arg` of `sink`
    pub fn link_arg(&mut self, source: FieldId, sink: FieldId, arg: usize) -> RippleResult<LinkId> {
        self.field(source)?;
        let id = LinkId::new(self.links.len() as u32);

        let field = self.field_mut(sink)?;
        if field.is_input() {
            return Err(RippleError::NotAnInput(sink));
        }
        match field.arity() {
            Arity::Fixed(arity) if arg >= arity => {
                return Err(RippleError::ArgumentOutOfRange {
                    field: sink,
                    arg,
                    arity,
                });
            }
            Arity::Variadic if arg >= field.inputs.len() => {
                field.inputs.resize(arg + 1, InputSlot::vacant());
            }
            _ => {}
        }
        let slot = &mut field.inputs[arg];
        if slot.link.is_some() {
            return Err(RippleError::ArgumentInUse { field: sink, arg });
        }
        slot.link = Some(id);

        self.field_mut(source)?.outputs.push(id);
        self.links.push(Some(FieldLink::new(id, source, sink, arg)));
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Connect a link. With `initialize`, the source's current value is
    /// delivered as if the link had always existed. No-op if connected.
    pub fn connect(&mut self, link: LinkId, initialize: bool, queue: &mut Queue) -> RippleResult<()> {
        let l = self.link_mut(link)?;
        if l.connected {
            return Ok(());
        }
        l.connected = true;
        let l = *l;

        self.field_mut(l.source)?.receivers.push(link);
        self.field_mut(l.sink)?.inputs[l.arg].connected = true;
        tracing::debug!(?link, source = ?l.source, sink = ?l.sink, arg = l.arg, initialize, "link connected");

        if initialize {
            let value = self.field(l.source)?.value;
            if value != 0.0 || self.recomputes(l.sink)? {
                self.deliver(&l, value, queue)?;
            }
        }
        Ok(())
    }

    /// Disconnect a link. With `deinitialize`, the contribution the sink
    /// has incorporated over this link is retracted. No-op if disconnected.
    pub fn disconnect(
        &mut self,
        link: LinkId,
        deinitialize: bool,
        queue: &mut Queue,
    ) -> RippleResult<()> {
        let l = self.link_mut(link)?;
        if !l.connected {
            return Ok(());
        }
        l.connected = false;
        let l = *l;

        self.field_mut(l.source)?.receivers.retain(|&r| r != link);
        let sink = self.field_mut(l.sink)?;
        sink.inputs[l.arg].connected = false;
        let contribution = sink.inputs[l.arg].value;
        tracing::debug!(?link, source = ?l.source, sink = ?l.sink, arg = l.arg, deinitialize, "link disconnected");

        if deinitialize && (contribution != 0.0 || self.recomputes(l.sink)?) {
            self.deliver(&l, -contribution, queue)?;
        }
        Ok(())
    }

    /// Disconnect a link and free its argument slot
    pub fn unlink(&mut self, link: LinkId, deinitialize: bool, queue: &mut Queue) -> RippleResult<()> {
        self.disconnect(link, deinitialize, queue)?;
        let l = self.links[link.index()]
            .take()
            .ok_or(RippleError::LinkNotFound(link))?;

        if let Some(source) = self.slot_mut(l.source) {
            source.outputs.retain(|&o| o != link);
        }
        if let Some(sink) = self.slot_mut(l.sink) {
            sink.inputs[l.arg].link = None;
        }
        Ok(())
    }

    /// Sever every input link of a field
    pub fn disconnect_and_unlink_inputs(
        &mut self,
        id: FieldId,
        deinitialize: bool,
        queue: &mut Queue,
    ) -> RippleResult<()> {
        let links: Vec<LinkId> = self.field(id)?.inputs.iter().filter_map(|s| s.link).collect();
        for link in links {
            self.unlink(link, deinitialize, queue)?;
        }
        Ok(())
    }

    /// Sever every output link of a field
    pub fn disconnect_and_unlink_outputs(
        &mut self,
        id: FieldId,
        deinitialize: bool,
        queue: &mut Queue,
    ) -> RippleResult<()> {
        let links = self.field(id)?.outputs.clone();
        for link in links {
            self.unlink(link, deinitialize, queue)?;
        }
        Ok(())
    }

    /// Tear a field down. Downstream contributions are retracted when
    /// `deinitialize` is set; pending steps are dropped from the queue.
    pub fn remove_field(&mut self, id: FieldId, deinitialize: bool, queue: &mut Queue) -> RippleResult<()> {
        self.disconnect_and_unlink_outputs(id, deinitialize, queue)?;
        self.disconnect_and_unlink_inputs(id, false, queue)?;

        let mut field = self.fields[id.index()]
            .take()
            .ok_or(RippleError::FieldNotFound(id))?;
        if let FieldKind::Deferred(state) = &mut field.kind {
            for mut step in state.take_all() {
                queue.remove(&mut step);
            }
        }
        tracing::debug!(field = ?id, label = %field.label, "field removed");
        Ok(())
    }

    pub fn set_propagate_updates(&mut self, link: LinkId, propagate: bool) -> RippleResult<()> {
        self.link_mut(link)?.propagate_updates = propagate;
        Ok(())
    }

    /// Route updates over `link` into the sink's next-round bucket
    pub fn set_increment_round(&mut self, link: LinkId, increment: bool) -> RippleResult<()> {
        let sink = self.link_ref(link)?.sink;
        if increment && !self.field(sink)?.is_deferred() {
            return Err(RippleError::RoundRequiresQueueField(sink));
        }
        self.link_mut(link)?.increment_round = increment;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Assign a root field. Deltas below the field's tolerance are dropped.
    pub fn set_value(&mut self, id: FieldId, value: f64, queue: &mut Queue) -> RippleResult<()> {
        let field = self.field_mut(id)?;
        if !field.is_input() {
            return Err(RippleError::NotAssignable(id));
        }
        if field.within_update {
            return Err(RippleError::ReentrantUpdate(id));
        }
        field.pending = value;
        self.commit(id, queue)
    }

    /// Apply a step handed out by `Queue::pop`. Returns false when the
    /// step no longer refers to anything live (field torn down, or the
    /// step was merged away), which is not an error.
    pub fn process_step(&mut self, entry: &StepEntry, queue: &mut Queue) -> RippleResult<bool> {
        let Some(field) = self.slot_mut(entry.target) else {
            tracing::trace!(step = ?entry.step, target = ?entry.target, "step target torn down");
            return Ok(false);
        };
        let FieldKind::Deferred(state) = &mut field.kind else {
            return Ok(false);
        };
        let Some(mut step) = state.take(entry.step) else {
            tracing::trace!(step = ?entry.step, target = ?entry.target, "stale step skipped");
            return Ok(false);
        };
        step.mark_dequeued();
        self.apply_step(entry.target, &step, queue)?;
        Ok(true)
    }

    /// Re-arm the trigger of a feedback function
    pub fn reset_trigger(&mut self, id: FieldId) -> RippleResult<bool> {
        match &mut self.field_mut(id)?.kind {
            FieldKind::Function(function) => Ok(function.reset_trigger()),
            _ => Ok(false),
        }
    }

    /// Argument currently published by a max/min node
    pub fn selected_argument(&self, id: FieldId) -> RippleResult<Option<usize>> {
        match &self.field(id)?.kind {
            FieldKind::Function(function) => Ok(function.selected()),
            _ => Ok(None),
        }
    }

    fn apply_step(&mut self, id: FieldId, step: &Step, queue: &mut Queue) -> RippleResult<()> {
        self.field_mut(id)?.pending += step.delta();
        self.commit(id, queue)
    }

    /// Turn `pending - value` into a propagated delta
    fn commit(&mut self, id: FieldId, queue: &mut Queue) -> RippleResult<()> {
        let epsilon = self.config.zero_epsilon;
        let field = self.field_mut(id)?;
        if field.within_update {
            return Err(RippleError::ReentrantUpdate(id));
        }

        let mut updated = field.pending;
        if updated.abs() < epsilon {
            updated = 0.0;
        }
        let delta = updated - field.value;
        if field.suppresses(delta) {
            return Ok(());
        }

        field.pending = updated;
        field.within_update = true;
        let receivers = field.receivers.clone();

        let result = self.propagate(&receivers, delta, queue);

        let field = self.field_mut(id)?;
        let previous = field.value;
        field.value = updated;
        field.within_update = false;
        if result.is_ok() {
            field.notify(previous, delta);
        }
        result
    }

    fn propagate(&mut self, receivers: &[LinkId], delta: f64, queue: &mut Queue) -> RippleResult<()> {
        for &link in receivers {
            let Some(l) = self.links.get(link.index()).copied().flatten() else {
                continue;
            };
            if l.carries_updates() {
                self.deliver(&l, delta, queue)?;
            }
        }
        Ok(())
    }

    /// Whether a function sink must be evaluated even for a zero delta
    fn recomputes(&self, id: FieldId) -> RippleResult<bool> {
        Ok(matches!(&self.field(id)?.kind, FieldKind::Function(f) if f.recomputes()))
    }

    /// Hand a delta to the sink of a link
    fn deliver(&mut self, link: &FieldLink, delta: f64, queue: &mut Queue) -> RippleResult<()> {
        let sink = link.sink;
        let field = self.field_mut(sink)?;
        match &mut field.kind {
            FieldKind::Input => Err(RippleError::NotAnInput(sink)),
            FieldKind::Function(function) => {
                if field.within_update {
                    return Err(RippleError::ReentrantUpdate(sink));
                }
                let output = function.compute(link.arg, delta, &field.inputs, field.pending);
                field.inputs[link.arg].value += delta;
                match output {
                    Output::Delta(d) => field.pending += d,
                    Output::Value(v) => field.pending = v,
                    Output::Unchanged => return Ok(()),
                }
                self.commit(sink, queue)
            }
            FieldKind::Deferred(_) => {
                field.inputs[link.arg].value += delta;
                self.receive_deferred(sink, delta, link.increment_round, queue)
            }
        }
    }

    /// File a delta into the step of the requested round bucket
    fn receive_deferred(
        &mut self,
        id: FieldId,
        delta: f64,
        next_round: bool,
        queue: &mut Queue,
    ) -> RippleResult<()> {
        let precision = queue.config().sort_precision;
        let round = queue.round();

        let field = self.field_mut(id)?;
        let owner = field.owner;
        let FieldKind::Deferred(state) = &mut field.kind else {
            return Err(RippleError::RoundRequiresQueueField(id));
        };
        state.slide(round, queue);

        let (bucket, step_round) = if next_round {
            (Bucket::Next, round + 1)
        } else {
            (Bucket::Current, round)
        };
        let phase = state.phase();
        let value_sorted = state.is_value_sorted();
        let slot = state.slot_mut(bucket);
        let step = slot
            .get_or_insert_with(|| Step::new(queue.next_step_id(), id, owner, phase, step_round));
        step.accumulate(delta);
        if value_sorted {
            let sort_value = Step::magnitude_sort_value(step.delta(), precision);
            queue.resort(step, sort_value);
        }

        match queue.add(step) {
            Scheduled::Inserted => Ok(()),
            Scheduled::AlreadyQueued => {
                tracing::trace!(step = ?step.id(), target = ?id, ?bucket, "delta merged into queued step");
                Ok(())
            }
            Scheduled::Rejected => {
                // No live session: apply in place
                let Some(step) = slot.take() else {
                    return Ok(());
                };
                self.apply_step(id, &step, queue)
            }
        }
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Fire `callback` whenever the field rises to a positive value
    pub fn add_event_listener(
        &mut self,
        id: FieldId,
        name: impl Into<String>,
        callback: impl FnMut(&FieldUpdate) + 'static,
    ) -> RippleResult<()> {
        self.add_listener(id, name.into(), ListenerKind::Event, Box::new(callback))
    }

    /// Fire `callback` on every accepted update of the field
    pub fn add_update_listener(
        &mut self,
        id: FieldId,
        name: impl Into<String>,
        callback: impl FnMut(&FieldUpdate) + 'static,
    ) -> RippleResult<()> {
        self.add_listener(id, name.into(), ListenerKind::Update, Box::new(callback))
    }

    /// Remove every listener registered under `name`
    pub fn remove_listener(&mut self, id: FieldId, name: &str) -> RippleResult<bool> {
        let listeners = &mut self.field_mut(id)?.listeners;
        let before = listeners.len();
        listeners.retain(|l| l.name != name);
        Ok(listeners.len() != before)
    }

    fn add_listener(
        &mut self,
        id: FieldId,
        name: String,
        kind: ListenerKind,
        callback: ListenerFn,
    ) -> RippleResult<()> {
        self.field_mut(id)?.listeners.push(Listener {
            name,
            kind,
            callback,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn field(&self, id: FieldId) -> RippleResult<&Field> {
        self.fields
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(RippleError::FieldNotFound(id))
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> RippleResult<&mut Field> {
        self.slot_mut(id).ok_or(RippleError::FieldNotFound(id))
    }

    fn slot_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn link_ref(&self, id: LinkId) -> RippleResult<&FieldLink> {
        self.links
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(RippleError::LinkNotFound(id))
    }

    fn link_mut(&mut self, id: LinkId) -> RippleResult<&mut FieldLink> {
        self.links
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(RippleError::LinkNotFound(id))
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.field(id).is_ok()
    }

    pub fn value(&self, id: FieldId) -> RippleResult<f64> {
        Ok(self.field(id)?.value())
    }

    pub fn updated_value(&self, id: FieldId) -> RippleResult<f64> {
        Ok(self.field(id)?.updated_value())
    }

    pub fn label(&self, id: FieldId) -> RippleResult<&str> {
        Ok(self.field(id)?.label())
    }

    pub fn owner(&self, id: FieldId) -> RippleResult<OwnerId> {
        Ok(self.field(id)?.owner())
    }

    pub fn value_as_string(&self, id: FieldId) -> RippleResult<String> {
        Ok(self.field(id)?.value_as_string())
    }

    /// Variant name: "input", "queue", "sorted-queue" or the function name
    pub fn kind_name(&self, id: FieldId) -> RippleResult<&'static str> {
        Ok(self.field(id)?.kind_name())
    }

    pub fn is_within_update(&self, id: FieldId) -> RippleResult<bool> {
        Ok(self.field(id)?.is_within_update())
    }

    /// Delta waiting in a queue field's bucket (zero for other fields)
    pub fn pending_delta(&self, id: FieldId, bucket: Bucket) -> RippleResult<f64> {
        Ok(self
            .field(id)?
            .deferred()
            .map_or(0.0, |state| state.pending_delta(bucket)))
    }

    /// Live fields in creation order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter_map(Option::as_ref)
    }

    /// Live links in creation order
    pub fn links(&self) -> impl Iterator<Item = &FieldLink> {
        self.links.iter().filter_map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.fields().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FieldGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Addition, Multiplication, Sum};
    use std::cell::RefCell;
    use std::rc::Rc;

    const OWNER: OwnerId = OwnerId(1);

    fn wired(graph: &mut FieldGraph, queue: &mut Queue, sources: &[FieldId], sink: FieldId) -> Vec<LinkId> {
        sources
            .iter()
            .map(|&s| {
                let link = graph.link(s, sink).unwrap();
                graph.connect(link, true, queue).unwrap();
                link
            })
            .collect()
    }

    #[test]
    fn test_set_value_propagates_through_sum() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let b = graph.add_input(OWNER, "b", None);
        let s = graph.add_function(OWNER, "s", None, Sum);
        wired(&mut graph, &mut queue, &[a, b], s);

        graph.set_value(a, 1.5, &mut queue).unwrap();
        graph.set_value(b, -0.5, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 1.0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tolerance_suppresses_without_losing_delta() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let s = graph.add_function(OWNER, "s", Some(0.1), Sum);
        wired(&mut graph, &mut queue, &[a], s);

        graph.set_value(a, 0.05, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 0.0);
        graph.set_value(a, 0.12, &mut queue).unwrap();
        assert!((graph.value(s).unwrap() - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_set_value_tolerance_noop() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", Some(0.5));
        graph.set_value(a, 0.2, &mut queue).unwrap();
        assert_eq!(graph.value(a).unwrap(), 0.0);
    }

    #[test]
    fn test_near_zero_normalized() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let s = graph.add_function(OWNER, "s", None, Sum);
        wired(&mut graph, &mut queue, &[a], s);

        graph.set_value(a, 0.1 + 0.2, &mut queue).unwrap();
        graph.set_value(a, 0.3 + 1e-12, &mut queue).unwrap();
        graph.set_value(a, 1e-12, &mut queue).unwrap();
        assert_eq!(graph.value(a).unwrap(), 0.0);
        assert_eq!(graph.value(s).unwrap(), 0.0);
    }

    #[test]
    fn test_connect_disconnect_conserves() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let b = graph.add_input(OWNER, "b", None);
        graph.set_value(a, 2.0, &mut queue).unwrap();
        graph.set_value(b, 3.0, &mut queue).unwrap();
        let m = graph.add_function(OWNER, "m", None, Multiplication);
        let links = wired(&mut graph, &mut queue, &[a, b], m);
        assert_eq!(graph.value(m).unwrap(), 6.0);

        let c = graph.add_input(OWNER, "c", None);
        graph.set_value(c, 7.0, &mut queue).unwrap();
        let s = graph.add_function(OWNER, "s", None, Addition);
        wired(&mut graph, &mut queue, &[m], s);
        let extra = graph.link(c, s).unwrap();
        graph.connect(extra, true, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 13.0);
        graph.disconnect(extra, true, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 6.0);

        graph.disconnect(links[1], true, &mut queue).unwrap();
        assert_eq!(graph.value(m).unwrap(), 0.0);
        assert_eq!(graph.value(s).unwrap(), 0.0);
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        graph.set_value(a, 1.0, &mut queue).unwrap();
        let s = graph.add_function(OWNER, "s", None, Sum);
        let link = graph.link(a, s).unwrap();

        graph.connect(link, true, &mut queue).unwrap();
        graph.connect(link, true, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 1.0);
        assert_eq!(graph.field(a).unwrap().receivers().len(), 1);

        graph.disconnect(link, true, &mut queue).unwrap();
        graph.disconnect(link, true, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 0.0);
        assert!(graph.field(a).unwrap().receivers().is_empty());
        assert!(!graph.field(s).unwrap().inputs()[0].is_connected());
    }

    #[test]
    fn test_disconnect_without_deinitialize_keeps_value() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        graph.set_value(a, 1.0, &mut queue).unwrap();
        let s = graph.add_function(OWNER, "s", None, Sum);
        let links = wired(&mut graph, &mut queue, &[a], s);

        graph.disconnect(links[0], false, &mut queue).unwrap();
        graph.set_value(a, 5.0, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 1.0);
    }

    #[test]
    fn test_propagate_updates_flag() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        graph.set_value(a, 1.0, &mut queue).unwrap();
        let s = graph.add_function(OWNER, "s", None, Sum);
        let links = wired(&mut graph, &mut queue, &[a], s);

        graph.set_propagate_updates(links[0], false).unwrap();
        graph.set_value(a, 4.0, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 1.0);

        // Retraction removes exactly what was incorporated
        graph.disconnect(links[0], true, &mut queue).unwrap();
        assert_eq!(graph.value(s).unwrap(), 0.0);
    }

    #[test]
    fn test_argument_errors() {
        let mut graph = FieldGraph::new();
        let a = graph.add_input(OWNER, "a", None);
        let b = graph.add_input(OWNER, "b", None);
        let m = graph.add_function(OWNER, "m", None, Multiplication);

        assert_eq!(
            graph.link_arg(a, m, 2),
            Err(RippleError::ArgumentOutOfRange { field: m, arg: 2, arity: 2 })
        );
        graph.link_arg(a, m, 0).unwrap();
        assert_eq!(
            graph.link_arg(b, m, 0),
            Err(RippleError::ArgumentInUse { field: m, arg: 0 })
        );
        graph.link(b, m).unwrap();
        assert_eq!(graph.link(b, m), Err(RippleError::NoFreeArgument(m)));
        assert_eq!(graph.link(a, b), Err(RippleError::NotAnInput(b)));
        assert_eq!(graph.set_value(m, 1.0, &mut Queue::new()), Err(RippleError::NotAssignable(m)));
    }

    #[test]
    fn test_synchronous_cycle_is_reentrant_error() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let x = graph.add_function(OWNER, "x", None, Sum);
        let y = graph.add_function(OWNER, "y", None, Sum);
        wired(&mut graph, &mut queue, &[a, y], x);
        wired(&mut graph, &mut queue, &[x], y);

        assert_eq!(
            graph.set_value(a, 1.0, &mut queue),
            Err(RippleError::ReentrantUpdate(x))
        );
        assert!(!graph.is_within_update(x).unwrap());
        assert!(!graph.is_within_update(y).unwrap());
    }

    #[test]
    fn test_increment_round_requires_queue_field() {
        let mut graph = FieldGraph::new();
        let a = graph.add_input(OWNER, "a", None);
        let s = graph.add_function(OWNER, "s", None, Sum);
        let link = graph.link(a, s).unwrap();
        assert_eq!(
            graph.set_increment_round(link, true),
            Err(RippleError::RoundRequiresQueueField(s))
        );
    }

    #[test]
    fn test_queue_field_defers_until_processed() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let q = graph.add_queue_field(OWNER, "q", None, Phase::Inference);
        let out = graph.add_function(OWNER, "out", None, Sum);
        wired(&mut graph, &mut queue, &[a], q);
        wired(&mut graph, &mut queue, &[q], out);

        graph.set_value(a, 0.4, &mut queue).unwrap();
        graph.set_value(a, 0.7, &mut queue).unwrap();
        assert_eq!(graph.value(q).unwrap(), 0.0);
        assert_eq!(queue.len(), 1);
        assert!((graph.pending_delta(q, Bucket::Current).unwrap() - 0.7).abs() < 1e-12);

        let entry = queue.pop().unwrap();
        assert!(graph.process_step(&entry, &mut queue).unwrap());
        assert!((graph.value(q).unwrap() - 0.7).abs() < 1e-12);
        assert!((graph.value(out).unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(graph.pending_delta(q, Bucket::Current).unwrap(), 0.0);
    }

    #[test]
    fn test_offline_queue_applies_in_place() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::offline();
        let a = graph.add_input(OWNER, "a", None);
        let q = graph.add_queue_field(OWNER, "q", None, Phase::Inference);
        wired(&mut graph, &mut queue, &[a], q);

        graph.set_value(a, 0.3, &mut queue).unwrap();
        assert!((graph.value(q).unwrap() - 0.3).abs() < 1e-12);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_removed_field_step_is_noop() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        let q = graph.add_queue_field(OWNER, "q", None, Phase::Inference);
        wired(&mut graph, &mut queue, &[a], q);
        graph.set_value(a, 1.0, &mut queue).unwrap();

        let entry = *queue.peek().unwrap();
        graph.remove_field(q, true, &mut queue).unwrap();
        assert!(queue.is_empty());
        assert!(!graph.process_step(&entry, &mut queue).unwrap());
        assert!(graph.field(a).unwrap().outputs().is_empty());
    }

    #[test]
    fn test_update_listener_sees_every_accepted_update() {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", Some(0.01));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        graph
            .add_update_listener(a, "log", move |u| sink.borrow_mut().push(u.delta))
            .unwrap();

        graph.set_value(a, 0.5, &mut queue).unwrap();
        graph.set_value(a, 0.505, &mut queue).unwrap();
        graph.set_value(a, 0.2, &mut queue).unwrap();
        assert_eq!(seen.borrow().len(), 2);

        assert!(graph.remove_listener(a, "log").unwrap());
        graph.set_value(a, 0.9, &mut queue).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }
}
