//! Feedback bootstrap - baseline for annealed contributions

use crate::{updated_input, Arity, FieldFunction, InputSlot, Output};

/// Argument 0 carries the contribution, argument 1 the annealing signal.
///
/// While armed, the first update to argument 0 discards its literal delta
/// and emits `input - 1.0` to establish the baseline; afterwards argument 0
/// passes through. Argument 1 never changes the output here.
#[derive(Clone, Copy, Debug)]
pub struct Feedback {
    trigger: bool,
}

impl Feedback {
    pub fn new() -> Self {
        Feedback { trigger: true }
    }

    pub fn is_armed(&self) -> bool {
        self.trigger
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldFunction for Feedback {
    fn name(&self) -> &'static str {
        "feedback"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        if arg != 0 {
            return Output::Unchanged;
        }
        if self.trigger {
            self.trigger = false;
            return Output::Delta(updated_input(inputs, 0, arg, delta) - 1.0);
        }
        Output::Delta(delta)
    }

    fn reset_trigger(&mut self) -> bool {
        self.trigger = true;
        true
    }
}
