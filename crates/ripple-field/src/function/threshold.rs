//! Threshold - continuous input to a 1.0 / 0.0 signal

use std::fmt;

use crate::{updated_input, Arity, FieldFunction, InputSlot, Output};

/// Comparison applied between the input and the threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    Above,
    AboveOrEqual,
    Below,
    BelowOrEqual,
}

impl Comparator {
    #[inline]
    pub fn test(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Above => value > threshold,
            Comparator::AboveOrEqual => value >= threshold,
            Comparator::Below => value < threshold,
            Comparator::BelowOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Above => ">",
            Comparator::AboveOrEqual => ">=",
            Comparator::Below => "<",
            Comparator::BelowOrEqual => "<=",
        };
        f.write_str(s)
    }
}

/// Outputs 1.0 while `comparator(input, threshold)` holds, else 0.0.
///
/// In final mode the output latches at 1.0 once reached.
#[derive(Clone, Copy, Debug)]
pub struct Threshold {
    pub threshold: f64,
    pub comparator: Comparator,
    pub final_mode: bool,
}

impl Threshold {
    pub fn new(threshold: f64, comparator: Comparator) -> Self {
        Threshold {
            threshold,
            comparator,
            final_mode: false,
        }
    }

    pub fn latching(threshold: f64, comparator: Comparator) -> Self {
        Threshold {
            final_mode: true,
            ..Threshold::new(threshold, comparator)
        }
    }
}

impl FieldFunction for Threshold {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn recomputes(&self) -> bool {
        true
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], pending: f64) -> Output {
        if self.final_mode && pending > 0.0 {
            return Output::Unchanged;
        }
        let input = updated_input(inputs, 0, arg, delta);
        if self.comparator.test(input, self.threshold) {
            Output::Value(1.0)
        } else {
            Output::Value(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparators() {
        assert!(Comparator::Above.test(0.1, 0.0));
        assert!(!Comparator::Above.test(0.0, 0.0));
        assert!(Comparator::AboveOrEqual.test(0.0, 0.0));
        assert!(Comparator::Below.test(-0.1, 0.0));
        assert!(Comparator::BelowOrEqual.test(0.0, 0.0));
        assert_eq!(Comparator::BelowOrEqual.to_string(), "<=");
    }

    #[test]
    fn test_threshold_follows_input() {
        let mut t = Threshold::new(0.0, Comparator::Above);
        let slot = [InputSlot::with_value(0.0)];
        assert_eq!(t.compute(0, 0.5, &slot, 0.0), Output::Value(1.0));
        let slot = [InputSlot::with_value(0.5)];
        assert_eq!(t.compute(0, -1.0, &slot, 1.0), Output::Value(0.0));
    }

    #[test]
    fn test_final_mode_latches() {
        let mut t = Threshold::latching(0.0, Comparator::Above);
        let slot = [InputSlot::with_value(0.5)];
        assert_eq!(t.compute(0, -1.0, &slot, 1.0), Output::Unchanged);
    }
}
