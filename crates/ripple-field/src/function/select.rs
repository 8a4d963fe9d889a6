//! Max / min selection

use crate::{updated_input, Arity, FieldFunction, InputSlot, Output};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Max,
    Min,
}

/// Publishes the value of the extreme connected argument.
///
/// Every update rescans all connected arguments. Fan-in is small in
/// practice, and the rescan keeps the winner correct when the current
/// winner itself moves away from the extreme. Ties go to the lower
/// argument index.
#[derive(Clone, Copy, Debug)]
pub struct Selection {
    mode: SelectionMode,
    winner: Option<usize>,
}

impl Selection {
    pub fn max() -> Self {
        Selection {
            mode: SelectionMode::Max,
            winner: None,
        }
    }

    pub fn min() -> Self {
        Selection {
            mode: SelectionMode::Min,
            winner: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    fn beats(&self, candidate: f64, best: f64) -> bool {
        match self.mode {
            SelectionMode::Max => candidate > best,
            SelectionMode::Min => candidate < best,
        }
    }
}

impl FieldFunction for Selection {
    fn name(&self) -> &'static str {
        match self.mode {
            SelectionMode::Max => "max",
            SelectionMode::Min => "min",
        }
    }

    fn arity(&self) -> Arity {
        Arity::Variadic
    }

    fn recomputes(&self) -> bool {
        true
    }

    fn compute(&mut self, arg: usize, delta: f64, inputs: &[InputSlot], _pending: f64) -> Output {
        let mut best: Option<(usize, f64)> = None;
        for (i, slot) in inputs.iter().enumerate() {
            if !slot.is_connected() {
                continue;
            }
            let value = updated_input(inputs, i, arg, delta);
            match best {
                Some((_, b)) if !self.beats(value, b) => {}
                _ => best = Some((i, value)),
            }
        }

        self.winner = best.map(|(i, _)| i);
        Output::Value(best.map_or(0.0, |(_, v)| v))
    }

    fn selected(&self) -> Option<usize> {
        self.winner
    }
}
