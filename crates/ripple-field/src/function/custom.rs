//! Caller-supplied functions of one or two arguments

use std::fmt;

use crate::{updated_input, Arity, FieldFunction, InputSlot, Output};

/// `f(x)`, re-evaluated on the updated input
pub struct Func {
    f: Box<dyn Fn(f64) -> f64>,
}

impl Func {
    pub fn new(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Func { f: Box::new(f) }
    }
}

impl FieldFunction for Func {
    fn name(&self) -> &'static str {
        "func"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn recomputes(&self) -> bool {
        true
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        Output::Value((self.f)(updated_input(inputs, 0, arg, delta)))
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func")
    }
}

/// `f(x0, x1)`, re-evaluated on the updated inputs
pub struct Func2 {
    f: Box<dyn Fn(f64, f64) -> f64>,
}

impl Func2 {
    pub fn new(f: impl Fn(f64, f64) -> f64 + 'static) -> Self {
        Func2 { f: Box::new(f) }
    }
}

impl FieldFunction for Func2 {
    fn name(&self) -> &'static str {
        "func2"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn recomputes(&self) -> bool {
        true
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        let x0 = updated_input(inputs, 0, arg, delta);
        let x1 = updated_input(inputs, 1, arg, delta);
        Output::Value((self.f)(x0, x1))
    }
}

impl fmt::Debug for Func2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func2")
    }
}
