//! Construction helpers
//!
//! Each helper creates a function node, links its inputs and connects them
//! with `initialize = true`, so the new node starts out consistent with the
//! current values of its inputs. Helpers taking optional inputs return
//! `Ok(None)` when a required input is missing, which lets callers build a
//! graph incrementally.

use ripple_core::{FieldId, LinkId, OwnerId, RippleError, RippleResult};
use ripple_sched::Queue;

use crate::{
    Addition, Comparator, Division, Feedback, FieldFunction, FieldGraph, Func, Func2, Invert,
    Multiplication, Scale, Selection, Subtraction, Sum, Threshold,
};

impl FieldGraph {
    /// Link `source` into the next free argument of `sink` and connect it
    pub fn connect_input(
        &mut self,
        source: FieldId,
        sink: FieldId,
        increment_round: bool,
        queue: &mut Queue,
    ) -> RippleResult<LinkId> {
        if increment_round && !self.field(sink)?.is_deferred() {
            return Err(RippleError::RoundRequiresQueueField(sink));
        }
        let link = self.link(source, sink)?;
        if increment_round {
            self.set_increment_round(link, true)?;
        }
        self.connect(link, true, queue)?;
        Ok(link)
    }

    fn connect_arg(
        &mut self,
        source: FieldId,
        sink: FieldId,
        arg: usize,
        queue: &mut Queue,
    ) -> RippleResult<LinkId> {
        let link = self.link_arg(source, sink, arg)?;
        self.connect(link, true, queue)?;
        Ok(link)
    }

    fn unary(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        function: impl FieldFunction + 'static,
        input: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        let Some(input) = input else {
            return Ok(None);
        };
        let node = self.add_function(owner, label, tolerance, function);
        self.connect_arg(input, node, 0, queue)?;
        Ok(Some(node))
    }

    #[allow(clippy::too_many_arguments)]
    fn binary(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        function: impl FieldFunction + 'static,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        let (Some(in1), Some(in2)) = (in1, in2) else {
            return Ok(None);
        };
        let node = self.add_function(owner, label, tolerance, function);
        self.connect_arg(in1, node, 0, queue)?;
        self.connect_arg(in2, node, 1, queue)?;
        Ok(Some(node))
    }

    /// `in1 + in2`
    pub fn add(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.binary(owner, label, None, Addition, in1, in2, queue)
    }

    /// `in1 - in2`
    pub fn sub(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.binary(owner, label, None, Subtraction, in1, in2, queue)
    }

    /// `in1 * in2`
    pub fn mul(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.binary(owner, label, None, Multiplication, in1, in2, queue)
    }

    /// `in1 / in2`. The denominator is wired first.
    pub fn div(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        let (Some(numerator), Some(denominator)) = (in1, in2) else {
            return Ok(None);
        };
        let node = self.add_function(owner, label, None, Division);
        self.connect_arg(denominator, node, 1, queue)?;
        self.connect_arg(numerator, node, 0, queue)?;
        Ok(Some(node))
    }

    /// `factor * input`
    pub fn scale(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        factor: f64,
        input: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.unary(owner, label, None, Scale { factor }, input, queue)
    }

    /// `1 - input`
    pub fn invert(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        input: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.unary(owner, label, None, Invert, input, queue)
    }

    /// 1.0 while `comparator(input, threshold)` holds. A `final_mode`
    /// node stays at 1.0 once reached.
    #[allow(clippy::too_many_arguments)]
    pub fn threshold(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        threshold: f64,
        comparator: Comparator,
        final_mode: bool,
        input: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        let function = Threshold {
            threshold,
            comparator,
            final_mode,
        };
        self.unary(owner, label, None, function, input, queue)
    }

    /// `f(input)`
    pub fn func(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        input: Option<FieldId>,
        f: impl Fn(f64) -> f64 + 'static,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.unary(owner, label, tolerance, Func::new(f), input, queue)
    }

    /// `f(in1, in2)`
    #[allow(clippy::too_many_arguments)]
    pub fn func2(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        tolerance: Option<f64>,
        in1: Option<FieldId>,
        in2: Option<FieldId>,
        f: impl Fn(f64, f64) -> f64 + 'static,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        self.binary(owner, label, tolerance, Func2::new(f), in1, in2, queue)
    }

    /// Sum over any number of inputs
    pub fn sum(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        inputs: &[FieldId],
        queue: &mut Queue,
    ) -> RippleResult<FieldId> {
        self.variadic(owner, label, Sum, inputs, queue)
    }

    /// Largest connected input
    pub fn max(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        inputs: &[FieldId],
        queue: &mut Queue,
    ) -> RippleResult<FieldId> {
        self.variadic(owner, label, Selection::max(), inputs, queue)
    }

    /// Smallest connected input
    pub fn min(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        inputs: &[FieldId],
        queue: &mut Queue,
    ) -> RippleResult<FieldId> {
        self.variadic(owner, label, Selection::min(), inputs, queue)
    }

    fn variadic(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        function: impl FieldFunction + 'static,
        inputs: &[FieldId],
        queue: &mut Queue,
    ) -> RippleResult<FieldId> {
        let node = self.add_function(owner, label, None, function);
        for &input in inputs {
            self.connect_input(input, node, false, queue)?;
        }
        Ok(node)
    }

    /// Feedback bootstrap over `trigger`, with an optional annealing input
    pub fn feedback(
        &mut self,
        owner: OwnerId,
        label: impl Into<String>,
        trigger: Option<FieldId>,
        anneal: Option<FieldId>,
        queue: &mut Queue,
    ) -> RippleResult<Option<FieldId>> {
        let Some(trigger) = trigger else {
            return Ok(None);
        };
        let node = self.add_function(owner, label, None, Feedback::new());
        if let Some(anneal) = anneal {
            self.connect_arg(anneal, node, 1, queue)?;
        }
        self.connect_arg(trigger, node, 0, queue)?;
        Ok(Some(node))
    }
}
