//! Function variants - sinks that derive a value from their inputs
//!
//! Every variant answers one question: given that argument `arg` changed
//! by `delta`, how does the output change? The slots passed in hold the
//! input values the node has incorporated *before* this update, so the
//! other arguments can be read without walking the graph.

mod arith;
mod custom;
mod feedback;
mod select;
mod threshold;

pub use arith::*;
pub use custom::*;
pub use feedback::*;
pub use select::*;
pub use threshold::*;

use crate::InputSlot;

/// Number of arguments a function accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many argument slots, preallocated
    Fixed(usize),
    /// Slots are appended in link order
    Variadic,
}

impl Arity {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Arity::Fixed(n) => Some(n),
            Arity::Variadic => None,
        }
    }
}

/// Result of an incremental update
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Output {
    /// Add this to the pending value
    Delta(f64),
    /// Replace the pending value
    Value(f64),
    /// The update does not affect this node
    Unchanged,
}

/// Incremental update rule of a function node
pub trait FieldFunction {
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Value of a node with no connected inputs
    fn initial_value(&self) -> f64 {
        0.0
    }

    /// Compute the effect of argument `arg` changing by `delta`.
    ///
    /// `inputs` still holds the old value of `arg`; `pending` is the value
    /// the node currently heads to.
    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], pending: f64) -> Output;

    /// Whether the output is recomputed from the whole input values rather
    /// than moved by the delta. Such nodes are evaluated on every connect
    /// and disconnect, even when no value crosses the link.
    fn recomputes(&self) -> bool {
        false
    }

    /// Re-arm a one-shot trigger. Returns false for functions without one.
    fn reset_trigger(&mut self) -> bool {
        false
    }

    /// Argument currently selected, for selection functions
    fn selected(&self) -> Option<usize> {
        None
    }
}

/// Input value of `arg` after applying `delta` (or the cached value for
/// any other argument)
#[inline]
pub(crate) fn updated_input(inputs: &[InputSlot], i: usize, arg: usize, delta: f64) -> f64 {
    let value = inputs.get(i).map_or(0.0, InputSlot::value);
    if i == arg {
        value + delta
    } else {
        value
    }
}
