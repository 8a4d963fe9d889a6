//! Arithmetic functions: sum, add, sub, mul, div, scale, invert

use crate::{updated_input, Arity, FieldFunction, InputSlot, Output};

/// N-ary sum, arguments identified by link order
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl FieldFunction for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self) -> Arity {
        Arity::Variadic
    }

    fn compute(&mut self, _arg: usize, delta: f64, _inputs: &[InputSlot], _pending: f64) -> Output {
        Output::Delta(delta)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Addition;

impl FieldFunction for Addition {
    fn name(&self) -> &'static str {
        "add"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn compute(&mut self, _arg: usize, delta: f64, _inputs: &[InputSlot], _pending: f64) -> Output {
        Output::Delta(delta)
    }
}

/// `arg0 - arg1`
#[derive(Clone, Copy, Debug, Default)]
pub struct Subtraction;

impl FieldFunction for Subtraction {
    fn name(&self) -> &'static str {
        "sub"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn compute(&mut self, arg: usize, delta: f64, _inputs: &[InputSlot], _pending: f64) -> Output {
        match arg {
            0 => Output::Delta(delta),
            _ => Output::Delta(-delta),
        }
    }
}

/// Product rule over the cached other argument
#[derive(Clone, Copy, Debug, Default)]
pub struct Multiplication;

impl FieldFunction for Multiplication {
    fn name(&self) -> &'static str {
        "mul"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        let other = if arg == 0 { 1 } else { 0 };
        Output::Delta(delta * inputs[other].value())
    }
}

/// `arg0 / arg1`
///
/// The quotient is evaluated in closed form over the cached arguments,
/// which is the exact quotient rule `u/(v+dv) - u/v` without the
/// cancellation trouble of bootstrapping from an all-zero cache. A zero
/// denominator is not special-cased: `x/0` is infinite and `0/0` is NaN.
#[derive(Clone, Copy, Debug, Default)]
pub struct Division;

impl FieldFunction for Division {
    fn name(&self) -> &'static str {
        "div"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        let numerator = updated_input(inputs, 0, arg, delta);
        let denominator = updated_input(inputs, 1, arg, delta);
        if denominator == 0.0 {
            tracing::warn!(numerator, "division node reached a zero denominator");
        }
        Output::Value(numerator / denominator)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Scale {
    pub factor: f64,
}

impl FieldFunction for Scale {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn compute(&mut self, _arg: usize, delta: f64, _inputs: &[InputSlot], _pending: f64) -> Output {
        Output::Delta(delta * self.factor)
    }
}

/// `1 - x`
#[derive(Clone, Copy, Debug, Default)]
pub struct Invert;

impl FieldFunction for Invert {
    fn name(&self) -> &'static str {
        "invert"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn initial_value(&self) -> f64 {
        1.0
    }

    fn compute(&mut self, _arg: usize, delta: f64, _inputs: &[InputSlot], _pending: f64) -> Output {
        Output::Delta(-delta)
    }
}
